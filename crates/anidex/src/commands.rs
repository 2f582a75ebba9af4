//! Subcommand handlers.

use crate::{Command, SeasonKind};
use anidex::api::client::Params;
use anidex::{collect_pages, JikanClient, JikanError, Pager};
use anyhow::{bail, Context, Result};
use shared::{
    status, CatalogEntry, Category, Config, SqliteStorage, TrackedItem, TrackerStore,
    TrackingData, TrackingStatus, TrackingUpdate,
};
use std::future::Future;
use tracing::{debug, info, warn};

pub struct App {
    client: JikanClient,
    store: TrackerStore<SqliteStorage>,
    config: Config,
}

impl App {
    pub fn new(client: JikanClient, store: TrackerStore<SqliteStorage>, config: Config) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        debug!(command = ?command, "Running command");

        match command {
            Command::Top {
                category,
                filter,
                page,
                pages,
            } => self.top(category, filter, page, pages).await,
            Command::Search {
                category,
                query,
                page,
                filters,
            } => self.search(category, &query, page, &filters).await,
            Command::Show {
                category,
                id,
                characters,
                recommendations,
            } => self.show(category, id, characters, recommendations).await,
            Command::Season { which } => self.season(which).await,
            Command::Genres { category } => self.genres(category).await,
            Command::List {
                category,
                status,
                favorites,
            } => {
                self.list(category, status, favorites);
                Ok(())
            }
            Command::Track {
                category,
                id,
                status,
                progress,
            } => self.track(category, id, status, progress).await,
            Command::Progress {
                category,
                id,
                delta,
            } => self.progress(category, id, delta),
            Command::Add { category, id } => self.add(category, id).await,
            Command::Remove { category, id } => self.remove(category, id),
            Command::Fav { category, id } => self.favorite(category, id).await,
            Command::Unfav { category, id } => self.unfavorite(category, id),
            Command::History => {
                self.history();
                Ok(())
            }
            Command::DarkMode => {
                self.store.toggle_dark_mode();
                println!("Dark mode: {}", on_off(self.store.dark_mode()));
                Ok(())
            }
            Command::Info => self.info(),
        }
    }

    /// Await an API call, mirroring it in the store's loading/error flags
    async fn fetch<T>(&mut self, request: impl Future<Output = Result<T, JikanError>>) -> Result<T> {
        self.store.clear_error();
        self.store.set_loading(true);

        match request.await {
            Ok(value) => {
                self.store.set_loading(false);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, status = ?e.status(), "API request failed");
                self.store.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    // ========== Catalog ==========

    async fn top(
        &mut self,
        category: Category,
        filter: Option<String>,
        page: u32,
        pages: u32,
    ) -> Result<()> {
        let client = self.client.clone();
        let mut pager = Pager::starting_at(page);

        let entries = match category {
            Category::Anime => {
                let filter = filter.unwrap_or_else(|| "airing".to_string());
                self.fetch(collect_pages(&mut pager, pages, |n| client.top_anime(n, &filter)))
                    .await?
            }
            Category::Manga => {
                let params: Vec<(String, String)> = filter
                    .map(|f| vec![("filter".to_string(), f)])
                    .unwrap_or_default();
                self.fetch(collect_pages(&mut pager, pages, |n| client.top_manga(n, &params)))
                    .await?
            }
            Category::Characters => {
                if filter.is_some() {
                    warn!("Filters are ignored for top characters");
                }
                let params = most_favorited();
                self.fetch(collect_pages(&mut pager, pages, |n| {
                    client.search_characters("", n, &params)
                }))
                .await?
            }
        };

        self.print_entries(category, &entries);
        if let Some(next) = pager.next_page() {
            println!("(more available from page {})", next);
        }
        Ok(())
    }

    async fn search(
        &mut self,
        category: Category,
        query: &str,
        page: u32,
        filters: &Params,
    ) -> Result<()> {
        let query = query.trim();
        self.store.record_search(query);

        let request = self.client.search(category, query, page, filters);
        let results = self.fetch(request).await?;
        info!(category = %category, query = query, results = results.data.len(), "Search finished");

        self.print_entries(category, &results.data);
        if let (true, Some(next)) = (results.has_next_page(), page.checked_add(1)) {
            println!("(more results on page {})", next);
        }
        Ok(())
    }

    async fn show(
        &mut self,
        category: Category,
        id: u32,
        characters: bool,
        recommendations: bool,
    ) -> Result<()> {
        let request = self.client.details(category, id);
        let entry = self.fetch(request).await?;

        println!("{}", format_entry(&entry, category));
        for field in ["type", "status", "score", "year", "url"] {
            if let Some(value) = display_field(&entry, field) {
                println!("  {:<8}{}", field, value);
            }
        }
        if let Some(tracking) = self.store.get_tracked_item(category, id).and_then(|i| i.tracking_data) {
            println!("  {:<8}{}", "list", format_tracking(&tracking, entry.total(category)));
        }
        if self.store.is_favorite(category, id) {
            println!("  favorite yes");
        }

        if (characters || recommendations) && category != Category::Anime {
            warn!(category = %category, "Characters and recommendations are only available for anime");
            return Ok(());
        }

        if characters {
            let request = self.client.anime_characters(id);
            let roles = self.fetch(request).await?;
            println!("\nCharacters:");
            for role in &roles {
                println!("  {} ({})", format_entry(&role.character, Category::Characters), role.role);
            }
        }

        if recommendations {
            let request = self.client.anime_recommendations(id);
            let recs = self.fetch(request).await?;
            println!("\nRecommendations:");
            for rec in &recs {
                println!("  {} ({} votes)", format_entry(&rec.entry, Category::Anime), rec.votes);
            }
        }

        Ok(())
    }

    async fn season(&mut self, which: SeasonKind) -> Result<()> {
        let season = match which {
            SeasonKind::Now => {
                let request = self.client.current_season();
                self.fetch(request).await?
            }
            SeasonKind::Upcoming => {
                let request = self.client.upcoming_season();
                self.fetch(request).await?
            }
        };
        self.print_entries(Category::Anime, &season.data);
        Ok(())
    }

    async fn genres(&mut self, category: Category) -> Result<()> {
        let genres = match category {
            Category::Anime => {
                let request = self.client.anime_genres();
                self.fetch(request).await?
            }
            Category::Manga => {
                let request = self.client.manga_genres();
                self.fetch(request).await?
            }
            Category::Characters => bail!("characters have no genres"),
        };

        for genre in &genres {
            println!("#{:<6} {} ({})", genre.mal_id, genre.name, genre.count);
        }
        Ok(())
    }

    /// Details of an entry, preferring the copy already stored locally
    async fn entry(&mut self, category: Category, id: u32) -> Result<CatalogEntry> {
        if let Some(item) = self.store.get_tracked_item(category, id) {
            return Ok(item.entry.clone());
        }
        if let Some(favorite) = self.store.favorites(category).iter().find(|f| f.mal_id == id) {
            return Ok(favorite.clone());
        }

        let request = self.client.details(category, id);
        self.fetch(request).await
    }

    // ========== List ==========

    fn list(&self, category: Option<Category>, status: Option<TrackingStatus>, favorites: bool) {
        let categories = category.map(|c| vec![c]).unwrap_or_else(|| Category::ALL.to_vec());

        for category in categories {
            if favorites {
                let items = self.store.favorites(category);
                println!("== Favorite {} ({}) ==", category, items.len());
                for item in items {
                    println!("{}", format_entry(item, category));
                }
                continue;
            }

            let items: Vec<&TrackedItem> = match status {
                Some(_) if !category.supports_tracking() => continue,
                Some(status) => self
                    .store
                    .items_with_status(category, status::for_category(status, category)),
                None => self.store.my_list(category).iter().collect(),
            };

            println!("== {} ({}) ==", category, items.len());
            if status.is_none() {
                if let Some(summary) = format_status_counts(&self.store.status_counts(category)) {
                    println!("{}", summary);
                }
            }
            for item in items {
                println!("{}", format_tracked(item, category));
            }
        }
    }

    async fn track(
        &mut self,
        category: Category,
        id: u32,
        status: Option<TrackingStatus>,
        progress: Option<u32>,
    ) -> Result<()> {
        if !category.supports_tracking() {
            bail!("{} cannot be tracked, use `add` instead", category);
        }

        let entry = self.entry(category, id).await?;
        self.store.open_status_editor(category, &entry);
        let defaults = self
            .store
            .status_editor_defaults()
            .context("Status editor did not open")?;

        let saved = self
            .store
            .save_status_editor(
                status.unwrap_or(defaults.status),
                progress.unwrap_or(defaults.progress),
            )
            .context("Status editor closed before saving")?;

        info!(category = %category, mal_id = id, status = %saved.status, progress = saved.progress, "Tracking updated");
        println!("{} {}", format_entry(&entry, category), format_tracking(&saved, entry.total(category)));
        Ok(())
    }

    fn progress(&mut self, category: Category, id: u32, delta: i64) -> Result<()> {
        if !category.supports_tracking() {
            bail!("{} have no progress", category);
        }
        let Some(item) = self.store.get_tracked_item(category, id) else {
            bail!("{} #{} is not in your list", category, id);
        };
        let total = item.entry.total(category);
        let current = TrackingUpdate::default().apply(item.tracking_data, category);
        if !current.status.is_active() {
            bail!(
                "{} #{} is {}, only {} entries have progress",
                category,
                id,
                current.status,
                TrackingStatus::active_for(category)
            );
        }

        let updated = self
            .store
            .adjust_progress(category, id, delta)
            .with_context(|| format!("{} #{} has no known total", category, id))?;

        println!("#{} {}", id, format_tracking(&updated, total));
        Ok(())
    }

    async fn add(&mut self, category: Category, id: u32) -> Result<()> {
        if self.store.is_tracked(category, id) {
            println!("#{} is already in your {} list", id, category);
            return Ok(());
        }

        let entry = self.entry(category, id).await?;
        if category.supports_tracking() {
            self.store
                .upsert_tracked_item(category, &entry, TrackingUpdate::default());
        } else {
            self.store.add_tracked_item(category, &entry);
        }

        info!(category = %category, mal_id = id, "Added to list");
        match self.store.get_tracked_item(category, id) {
            Some(item) => println!("Added {}", format_tracked(item, category)),
            None => println!("Added {}", format_entry(&entry, category)),
        }
        Ok(())
    }

    fn remove(&mut self, category: Category, id: u32) -> Result<()> {
        if !self.store.is_tracked(category, id) {
            println!("#{} is not in your {} list", id, category);
            return Ok(());
        }

        self.store.remove_tracked_item(category, id);
        info!(category = %category, mal_id = id, "Removed from list");
        println!("Removed #{} from your {} list", id, category);
        Ok(())
    }

    async fn favorite(&mut self, category: Category, id: u32) -> Result<()> {
        if self.store.is_favorite(category, id) {
            println!("#{} is already a favorite", id);
            return Ok(());
        }

        let entry = self.entry(category, id).await?;
        self.store.add_favorite(category, &entry);
        info!(category = %category, mal_id = id, "Added favorite");
        println!("Favorited {}", format_entry(&entry, category));
        Ok(())
    }

    fn unfavorite(&mut self, category: Category, id: u32) -> Result<()> {
        if !self.store.is_favorite(category, id) {
            println!("#{} is not a favorite", id);
            return Ok(());
        }

        self.store.remove_favorite(category, id);
        info!(category = %category, mal_id = id, "Removed favorite");
        println!("Removed #{} from favorite {}", id, category);
        Ok(())
    }

    fn history(&self) {
        let history = self.store.search_history();
        if history.is_empty() {
            println!("No recent searches");
            return;
        }
        for (i, query) in history.iter().enumerate() {
            println!("{:>2}. {}", i + 1, query);
        }
    }

    fn info(&self) -> Result<()> {
        let lists = self.store.list_counts();
        let favorites = self.store.favorite_counts();

        println!("{:<12}{:>6}{:>11}", "", "list", "favorites");
        for category in Category::ALL {
            println!(
                "{:<12}{:>6}{:>11}",
                category.as_str(),
                lists.get(category),
                favorites.get(category)
            );
        }
        println!();
        println!("Recent searches: {}", self.store.search_history().len());
        println!("Dark mode:       {}", on_off(self.store.dark_mode()));

        let storage_path = self.config.storage_path();
        println!("Storage:         {}", storage_path.display());
        let modified = self
            .store
            .storage()
            .modified_at(&self.config.storage.key)
            .context("Failed to read storage metadata")?;
        match modified {
            Some(at) => println!("Last saved:      {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last saved:      never"),
        }
        Ok(())
    }

    fn print_entries(&self, category: Category, entries: &[CatalogEntry]) {
        if entries.is_empty() {
            println!("No results");
            return;
        }

        for entry in entries {
            let mut marks = String::new();
            if self.store.is_tracked(category, entry.mal_id) {
                marks.push_str(" [listed]");
            }
            if self.store.is_favorite(category, entry.mal_id) {
                marks.push_str(" [fav]");
            }
            println!("{}{}", format_entry(entry, category), marks);
        }
    }
}

/// Query used for "top" characters, which Jikan has no ranking for
fn most_favorited() -> Vec<(String, String)> {
    vec![
        ("order_by".to_string(), "favorites".to_string()),
        ("sort".to_string(), "desc".to_string()),
    ]
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// One-line summary: id, title and episode/chapter total when known
pub(crate) fn format_entry(entry: &CatalogEntry, category: Category) -> String {
    let title = entry.title().unwrap_or("(untitled)");
    let mut line = format!("#{:<6} {}", entry.mal_id, title);

    if let (Some(total), Some(field)) = (entry.total(category), category.total_field()) {
        line.push_str(&format!(" ({} {})", total, field));
    }
    line
}

pub(crate) fn format_tracking(data: &TrackingData, total: Option<u32>) -> String {
    match total {
        Some(total) => format!("[{} {}/{}]", data.status, data.progress, total),
        None => format!("[{} {}/?]", data.status, data.progress),
    }
}

fn format_tracked(item: &TrackedItem, category: Category) -> String {
    let line = format_entry(&item.entry, category);
    match item.tracking_data {
        Some(data) => format!("{} {}", line, format_tracking(&data, item.entry.total(category))),
        None => line,
    }
}

/// Non-zero status counts, e.g. "Watching 2, Plan to Watch 1"
fn format_status_counts(counts: &[(TrackingStatus, usize)]) -> Option<String> {
    let parts: Vec<String> = counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("{} {}", status, count))
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn display_field(entry: &CatalogEntry, field: &str) -> Option<String> {
    match entry.fields.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
