use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

use crate::models::Todo;

/// Key the todo list is stored under.
pub const TODO_LIST_KEY: &str = "@todo_list";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo list could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage access failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// String-to-string persistent store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        log::info!("opened store at {}", path.display());
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(SqliteStore { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            [key, value],
        )?;
        Ok(())
    }
}

/// Reads and writes the whole todo list under [`TODO_LIST_KEY`].
///
/// Failures are logged here and never propagated as fatal: a failed load
/// behaves like an empty store and a failed save leaves no durable trace.
pub struct TodoStorage<S> {
    store: S,
}

impl<S: KeyValueStore> TodoStorage<S> {
    pub fn new(store: S) -> Self {
        TodoStorage { store }
    }

    pub fn save(&self, todos: &[Todo]) -> Result<(), StoreError> {
        let result = serde_json::to_string(todos)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set_item(TODO_LIST_KEY, &json));

        match &result {
            Ok(()) => log::debug!("saved {} todos", todos.len()),
            Err(e) => log::error!("failed to save todo list: {e}"),
        }
        result
    }

    pub fn load(&self) -> Vec<Todo> {
        match self.try_load() {
            Ok(todos) => {
                log::info!("loaded {} todos", todos.len());
                todos
            }
            Err(e) => {
                log::error!("failed to load todo list: {e}");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Todo>, StoreError> {
        match self.store.get_item(TODO_LIST_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}
