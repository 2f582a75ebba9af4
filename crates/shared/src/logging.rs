//! Logging infrastructure for anidex.
//!
//! This module provides structured logging with file rotation, contextual fields,
//! and module-specific log levels.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log directory path
    pub log_dir: String,
    /// Component name (used for log file naming)
    pub component: String,
    /// Default log level
    pub default_level: Level,
    /// Enable console output (stderr, so command output stays clean)
    pub console: bool,
    /// Enable file output
    pub file: bool,
    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "data/logs".to_string(),
            component: "anidex".to_string(),
            default_level: Level::INFO,
            console: false,
            file: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Build from the `[logging]` section of the configuration file
    pub fn from_config(config: &crate::Config, component: &str) -> Self {
        let default_level = config
            .logging
            .default_level
            .parse()
            .unwrap_or(Level::INFO);

        Self {
            log_dir: config.log_dir().to_string_lossy().to_string(),
            component: component.to_string(),
            default_level,
            console: config.logging.console,
            file: config.logging.file,
            json_format: config.logging.json_format,
        }
    }

    /// Filter directives used when `RUST_LOG` is not set
    pub fn filter_directives(&self) -> String {
        format!(
            "{}={},shared={},hyper=warn,reqwest=warn,h2=warn",
            self.component.replace('-', "_"),
            self.default_level,
            self.default_level
        )
    }
}

/// Initialize logging with the given configuration
///
/// Sets up tracing with:
/// - Daily file rotation
/// - Structured logging with contextual fields
/// - Module-specific log levels
/// - Optional JSON formatting
pub fn init(config: LogConfig) -> Result<()> {
    let log_dir = Path::new(&config.log_dir);
    if config.file {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", config.log_dir))?;
    }

    // Default to configured level, but allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers = Vec::new();

    if config.console {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(std::io::stderr)
            .boxed();
        layers.push(console_layer);
    }

    if config.file {
        let file_appender = tracing_appender::rolling::daily(log_dir, &config.component);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_appender)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender)
                .boxed()
        };

        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        component = %config.component,
        log_dir = %config.log_dir,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config() {
        let config = LogConfig::default();
        assert_eq!(config.component, "anidex");
        assert_eq!(config.default_level, Level::INFO);
        assert!(!config.console);
        assert!(config.file);
    }

    #[test]
    fn test_from_config() {
        let mut config = crate::Config::default();
        config.logging.default_level = "debug".to_string();
        config.logging.json_format = true;

        let log_config = LogConfig::from_config(&config, "anidex");
        assert_eq!(log_config.default_level, Level::DEBUG);
        assert!(log_config.json_format);
        assert!(log_config.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let mut config = crate::Config::default();
        config.logging.default_level = "chatty".to_string();

        let log_config = LogConfig::from_config(&config, "anidex");
        assert_eq!(log_config.default_level, Level::INFO);
    }

    #[test]
    fn test_filter_directives_use_crate_names() {
        let log_config = LogConfig {
            component: "my-client".to_string(),
            default_level: Level::WARN,
            ..Default::default()
        };
        let directives = log_config.filter_directives();
        assert!(directives.starts_with("my_client=WARN"));
        assert!(directives.contains("shared=WARN"));
    }
}
