use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "plannify=info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Flag first, then `PLANNIFY_*` environment variables, then files in `$HOME`.
    pub fn resolve(db_flag: Option<PathBuf>) -> Self {
        Self::resolve_with(db_flag, |name| std::env::var(name).ok())
    }

    fn resolve_with(db_flag: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Self {
        let home_dir = PathBuf::from(env("HOME").unwrap_or_else(|| ".".to_string()));

        let db_path = db_flag
            .or_else(|| env("PLANNIFY_DB").map(PathBuf::from))
            .unwrap_or_else(|| home_dir.join(".plannify.db"));
        let log_path = env("PLANNIFY_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir.join(".plannify.log"));
        let log_filter = env("PLANNIFY_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Config {
            db_path,
            log_path,
            log_filter,
        }
    }

    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Routes `log` records into a plain-text file so they never draw over the TUI.
pub fn init_logging(log_path: &Path, filter: &str) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!(e))
}
