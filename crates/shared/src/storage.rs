//! Local key-value storage for persisted client state.
//!
//! The store writes one JSON blob under one key. [`SqliteStorage`] keeps it in
//! a single-table SQLite file; [`MemoryStorage`] keeps it in process.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store exposed by the host environment
pub trait LocalStorage {
    /// Read the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

/// SQLite-backed storage
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open or create a storage file at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(path = %path.display(), "Opening local storage");
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %path.display(), "Local storage ready");
        Ok(Self { conn })
    }

    /// Storage that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// When the value under `key` was last written
    pub fn modified_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let updated_at = self
            .conn
            .query_row(
                "SELECT updated_at FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, DateTime<Utc>>(0),
            )
            .optional()?;
        Ok(updated_at)
    }
}

impl LocalStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now()],
        )?;
        debug!(key = key, bytes = value.len(), "Stored item");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process storage; contents are lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}
