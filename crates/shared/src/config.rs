//! Configuration management for anidex.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Jikan API settings
    pub jikan: JikanConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage file path (relative to data directory or absolute)
    pub path: String,

    /// Key the list data is saved under
    pub key: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Jikan API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Minimum spacing between two dispatched requests, in milliseconds
    pub request_interval_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "anidex.db".to_string(),
            key: crate::store::STORAGE_KEY.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: false,
            file: true,
            json_format: false,
        }
    }
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            request_interval_ms: 1100,
            timeout_seconds: 10,
            user_agent: concat!("anidex/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            jikan: JikanConfig::default(),
        }
    }
}

impl JikanConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Get the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the path of the local storage file
    pub fn storage_path(&self) -> PathBuf {
        self.resolve(&self.storage.path)
    }

    /// Get the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.root_dir, "data");
        assert_eq!(config.storage.path, "anidex.db");
        assert_eq!(config.storage.key, "animeAppData");
        assert_eq!(config.jikan.request_interval(), Duration::from_millis(1100));
        assert_eq!(config.jikan.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_written_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.jikan.request_interval_ms = 2000;
        std::fs::write(&config_path, toml::to_string_pretty(&original_config)?)?;

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(loaded_config.data.root_dir, original_config.data.root_dir);
        assert_eq!(loaded_config.jikan.base_url, original_config.jikan.base_url);
        assert_eq!(loaded_config.jikan.request_interval_ms, 2000);

        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::from_file(temp_dir.path().join("absent.toml"))?;
        assert_eq!(config.jikan.request_interval_ms, 1100);
        assert_eq!(config.storage_path(), PathBuf::from("data/anidex.db"));
        Ok(())
    }

    #[test]
    fn test_storage_section_is_optional() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[data]
root_dir = "/tmp/anidex"

[logging]
log_dir = "logs"
default_level = "debug"
console = true
file = false
json_format = false

[jikan]
base_url = "http://localhost:8080/v4"
request_interval_ms = 1100
timeout_seconds = 5
user_agent = "test"
"#,
        )?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.storage.key, "animeAppData");
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/anidex/anidex.db"));
        assert_eq!(config.jikan.timeout_seconds, 5);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        // Should return default config without error
        assert_eq!(config.data.root_dir, "data");
    }

    #[test]
    fn test_path_resolution() {
        let config = Config::default();
        assert!(config.storage_path().ends_with("data/anidex.db"));
        assert!(config.log_dir().ends_with("data/logs"));
    }
}
