//! anidex CLI application.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shared::{Category, Config, SqliteStorage, TrackerStore, TrackingStatus};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show top-ranked entries
    Top {
        category: Category,

        /// Upstream filter (airing, upcoming, bypopularity, favorites)
        #[arg(long)]
        filter: Option<String>,

        /// First page to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGES))]
        pages: u32,
    },

    /// Search the catalog (remembered in search history)
    Search {
        category: Category,

        query: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Extra filter as key=value (repeatable)
        #[arg(long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },

    /// Show one entry
    Show {
        category: Category,

        id: u32,

        /// Also list characters (anime only)
        #[arg(long)]
        characters: bool,

        /// Also list recommendations (anime only)
        #[arg(long)]
        recommendations: bool,
    },

    /// Show the current or upcoming season
    Season {
        #[arg(value_enum, default_value_t = SeasonKind::Now)]
        which: SeasonKind,
    },

    /// List genres
    Genres { category: Category },

    /// Show your list or favorites
    List {
        category: Option<Category>,

        /// Only entries with this status
        #[arg(long)]
        status: Option<TrackingStatus>,

        /// Show favorites instead of the list
        #[arg(long)]
        favorites: bool,
    },

    /// Set status and progress of an anime or manga
    Track {
        category: Category,

        id: u32,

        #[arg(long)]
        status: Option<TrackingStatus>,

        #[arg(long)]
        progress: Option<u32>,
    },

    /// Step progress up or down
    Progress {
        category: Category,

        id: u32,

        #[arg(allow_negative_numbers = true, default_value_t = 1)]
        delta: i64,
    },

    /// Add an entry to your list
    Add { category: Category, id: u32 },

    /// Remove an entry from your list
    Remove { category: Category, id: u32 },

    /// Add an entry to favorites
    Fav { category: Category, id: u32 },

    /// Remove an entry from favorites
    Unfav { category: Category, id: u32 },

    /// Show recent searches
    History,

    /// Toggle dark mode
    DarkMode,

    /// Show list statistics and storage location
    Info,
}

/// Upper bound for `top --pages`; each page costs one queued request
const MAX_PAGES: i64 = 20;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SeasonKind {
    Now,
    Upcoming,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = shared::LogConfig::from_config(&config, "anidex");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
        log_config.console = true;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "anidex starting");

    // Open local storage and hydrate the list
    let storage_path = config.storage_path();
    debug!(storage_path = %storage_path.display(), "Opening local storage");
    let storage = SqliteStorage::open(&storage_path)
        .with_context(|| format!("Failed to open storage at {}", storage_path.display()))?;
    let store = TrackerStore::load_with_key(storage, config.storage.key.clone());

    // Initialize API client
    let client = anidex::JikanClient::from_config(&config.jikan)
        .context("Failed to create Jikan client")?;

    let mut app = commands::App::new(client, store, config);
    app.run(args.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("order_by = score"),
            Ok(("order_by".to_string(), "score".to_string()))
        );
        assert!(parse_key_value("score").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "anidex",
            "track",
            "anime",
            "5114",
            "--status",
            "plan-to-watch",
        ])
        .unwrap();

        match args.command {
            Command::Track {
                category,
                id,
                status,
                progress,
            } => {
                assert_eq!(category, Category::Anime);
                assert_eq!(id, 5114);
                assert_eq!(status, Some(TrackingStatus::PlanToWatch));
                assert_eq!(progress, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_progress_delta() {
        let args = Args::try_parse_from(["anidex", "progress", "manga", "2", "-3"]).unwrap();
        assert!(matches!(args.command, Command::Progress { delta: -3, .. }));
    }

    #[test]
    fn test_page_arguments_are_bounded() {
        assert!(Args::try_parse_from(["anidex", "top", "anime", "--page", "0"]).is_err());
        assert!(Args::try_parse_from(["anidex", "top", "anime", "--pages", "21"]).is_err());
        assert!(Args::try_parse_from(["anidex", "search", "anime", "x", "--page", "0"]).is_err());

        let args = Args::try_parse_from(["anidex", "top", "manga", "--page", "4294967295"]).unwrap();
        assert!(matches!(args.command, Command::Top { page: u32::MAX, .. }));
    }

    #[test]
    fn test_command_definitions() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
