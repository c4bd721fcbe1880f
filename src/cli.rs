use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "A small to-do list for the terminal", long_about = None)]
pub struct Cli {
    /// SQLite database holding the todo list
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a todo
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// List all todos
    List,
    /// Delete a todo
    Delete {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Switch a todo between display and edit mode
    Toggle {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Put a todo back into display mode
    Confirm {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Replace the text of a todo
    Edit {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Launch TUI interface
    Tui,
    /// Print shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}
