mod cli;
mod config;
mod editor;
mod models;
mod storage;
mod todo_list;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::{init_logging, Config};
use storage::{SqliteStore, TodoStorage};
use todo_list::TodoList;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::resolve(cli.db);
    if let Err(e) = init_logging(&config.log_path, &config.log_filter) {
        eprintln!("Logging disabled: {e}");
    }
    config.ensure_db_dir()?;

    let store = SqliteStore::open(&config.db_path)?;
    let mut list = TodoList::load(TodoStorage::new(store));

    match cli.command {
        Some(Commands::Add { text }) => {
            list.set_draft(text);
            match list.add() {
                Some(id) => println!("Added todo {id}"),
                None => println!("Nothing to add: text is blank."),
            }
        }
        Some(Commands::List) => {
            println!("Todos:");
            println!("------");
            for todo in list.todos() {
                println!(
                    "{} | {} | {} | {}",
                    todo.id,
                    todo.mode.label(),
                    todo.created_date(),
                    todo.one_line_text()
                );
            }
        }
        Some(Commands::Delete { id }) => {
            report(id, list.delete(id), "deleted");
        }
        Some(Commands::Toggle { id }) => {
            let changed = list.toggle_mode(id);
            let mode = list.get(id).map(|t| t.mode.label()).unwrap_or_default();
            report(id, changed, &format!("switched to {mode} mode"));
        }
        Some(Commands::Confirm { id }) => {
            report(id, list.confirm_edit(id), "confirmed");
        }
        Some(Commands::Edit { id, text }) => {
            report(id, list.update_text(id, text), "updated");
        }
        Some(Commands::Tui) | None => {
            run_tui(list)?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "plannify", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn report(id: u64, found: bool, action: &str) {
    if found {
        println!("Todo {id} {action}");
    } else {
        println!("Todo {id} not found.");
    }
}
