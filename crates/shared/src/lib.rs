//! Shared library for the anidex client.
//!
//! This crate provides the pieces that do not talk to the network:
//! - Configuration management
//! - Logging infrastructure
//! - List data models and status rules
//! - The list/favorites store and its local storage

pub mod config;
pub mod logging;
pub mod models;
pub mod status;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;
pub use storage::{LocalStorage, MemoryStorage, SqliteStorage, StorageError};
pub use store::{TrackerStore, STORAGE_KEY};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
