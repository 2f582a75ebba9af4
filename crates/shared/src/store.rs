//! Client-side list/favorites store.
//!
//! The store owns the [`AppState`], exposes typed mutations over it and writes
//! the durable subset to local storage after every mutation that touches it.
//! Mutations that reference a missing entry are no-ops rather than errors.

use crate::models::*;
use crate::status;
use crate::storage::LocalStorage;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Key the persisted blob is stored under
pub const STORAGE_KEY: &str = "animeAppData";

/// Maximum number of remembered search queries
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Owner of the client state
pub struct TrackerStore<S: LocalStorage> {
    state: AppState,
    storage: S,
    key: String,
}

impl<S: LocalStorage> TrackerStore<S> {
    /// Create a store hydrated from `storage` under [`STORAGE_KEY`]
    pub fn load(storage: S) -> Self {
        Self::load_with_key(storage, STORAGE_KEY)
    }

    /// Create a store hydrated from `storage` under a custom key.
    ///
    /// Missing, unreadable or unparsable data leaves the defaults in place.
    pub fn load_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut state = AppState::default();

        match storage.get_item(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedPatch>(&raw) {
                Ok(patch) => {
                    state.merge_persisted(patch);
                    dedupe_by_identity(&mut state);
                    info!(
                        key = %key,
                        anime = state.my_list.anime.len(),
                        manga = state.my_list.manga.len(),
                        characters = state.my_list.characters.len(),
                        "Loaded saved list data"
                    );
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Ignoring unparsable saved data");
                }
            },
            Ok(None) => debug!(key = %key, "No saved data, starting fresh"),
            Err(e) => warn!(key = %key, error = %e, "Failed to read saved data"),
        }

        Self {
            state,
            storage,
            key,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn my_list(&self, category: Category) -> &[TrackedItem] {
        self.state.my_list.get(category)
    }

    pub fn favorites(&self, category: Category) -> &[FavoriteItem] {
        self.state.favorites.get(category)
    }

    pub fn search_history(&self) -> &[String] {
        &self.state.search_history
    }

    pub fn dark_mode(&self) -> bool {
        self.state.dark_mode
    }

    pub fn status_modal(&self) -> &StatusModal {
        &self.state.status_modal
    }

    // ========== Tracked items ==========

    /// Merge tracking data into the entry with the same identity, or append a
    /// new entry built from `item` and `update`.
    ///
    /// Categories without tracking only get the entry appended if absent.
    pub fn upsert_tracked_item(
        &mut self,
        category: Category,
        item: &CatalogEntry,
        update: TrackingUpdate,
    ) {
        let list = self.state.my_list.get_mut(category);

        match list.iter_mut().find(|i| i.mal_id() == item.mal_id) {
            Some(existing) => {
                if !category.supports_tracking() {
                    debug!(category = %category, mal_id = item.mal_id, "Entry already listed");
                    return;
                }
                let merged = update.apply(existing.tracking_data, category);
                let total = existing.entry.total(category);
                existing.tracking_data = Some(normalize(category, merged, total));
                debug!(category = %category, mal_id = item.mal_id, "Updated list entry");
            }
            None => {
                let tracking_data = category.supports_tracking().then(|| {
                    let merged = update.apply(None, category);
                    normalize(category, merged, item.total(category))
                });
                list.push(TrackedItem {
                    entry: item.clone(),
                    tracking_data,
                });
                debug!(category = %category, mal_id = item.mal_id, "Added list entry");
            }
        }

        self.persist();
    }

    /// Append an entry without tracking data (characters, quick-add)
    pub fn add_tracked_item(&mut self, category: Category, item: &CatalogEntry) {
        if self.is_tracked(category, item.mal_id) {
            debug!(category = %category, mal_id = item.mal_id, "Entry already listed");
            return;
        }

        self.state.my_list.get_mut(category).push(TrackedItem {
            entry: item.clone(),
            tracking_data: None,
        });
        self.persist();
    }

    pub fn remove_tracked_item(&mut self, category: Category, mal_id: u32) {
        let list = self.state.my_list.get_mut(category);
        let before = list.len();
        list.retain(|item| item.mal_id() != mal_id);

        if list.len() != before {
            self.persist();
        }
    }

    /// Partial update of an existing entry's tracking data
    pub fn update_tracked_item_status(
        &mut self,
        category: Category,
        mal_id: u32,
        update: TrackingUpdate,
    ) {
        if !category.supports_tracking() {
            return;
        }

        let Some(existing) = self
            .state
            .my_list
            .get_mut(category)
            .iter_mut()
            .find(|i| i.mal_id() == mal_id)
        else {
            debug!(category = %category, mal_id = mal_id, "Status update for unlisted entry ignored");
            return;
        };

        let merged = update.apply(existing.tracking_data, category);
        let total = existing.entry.total(category);
        existing.tracking_data = Some(normalize(category, merged, total));
        self.persist();
    }

    /// Step progress by `delta`, clamped to the known total.
    ///
    /// Only Watching/Reading entries have a stepper. Returns the new tracking
    /// data, or `None` when the entry is missing, untrackable, not in progress
    /// or has no known total.
    pub fn adjust_progress(
        &mut self,
        category: Category,
        mal_id: u32,
        delta: i64,
    ) -> Option<TrackingData> {
        if !category.supports_tracking() {
            return None;
        }

        let item = self.get_tracked_item(category, mal_id)?;
        let current = TrackingUpdate::default().apply(item.tracking_data, category);
        if !current.status.is_active() {
            debug!(category = %category, mal_id = mal_id, status = %current.status, "No progress stepper for status");
            return None;
        }
        let next = status::step(current, delta, item.entry.total(category))?;

        self.update_tracked_item_status(category, mal_id, next.into());
        self.get_tracked_item(category, mal_id)
            .and_then(|item| item.tracking_data)
    }

    pub fn is_tracked(&self, category: Category, mal_id: u32) -> bool {
        self.my_list(category).iter().any(|i| i.mal_id() == mal_id)
    }

    pub fn get_tracked_item(&self, category: Category, mal_id: u32) -> Option<&TrackedItem> {
        self.my_list(category).iter().find(|i| i.mal_id() == mal_id)
    }

    /// Entries of a category whose status matches
    pub fn items_with_status(
        &self,
        category: Category,
        status: TrackingStatus,
    ) -> Vec<&TrackedItem> {
        self.my_list(category)
            .iter()
            .filter(|i| i.tracking_data.map(|t| t.status) == Some(status))
            .collect()
    }

    /// Entry count per status, in the category's option order
    pub fn status_counts(&self, category: Category) -> Vec<(TrackingStatus, usize)> {
        if !category.supports_tracking() {
            return Vec::new();
        }

        TrackingStatus::options_for(category)
            .into_iter()
            .map(|status| (status, self.items_with_status(category, status).len()))
            .collect()
    }

    pub fn list_counts(&self) -> CategoryMap<usize> {
        self.state.my_list.map(Vec::len)
    }

    // ========== Favorites ==========

    pub fn add_favorite(&mut self, category: Category, item: &CatalogEntry) {
        if self.is_favorite(category, item.mal_id) {
            debug!(category = %category, mal_id = item.mal_id, "Already a favorite");
            return;
        }

        self.state.favorites.get_mut(category).push(item.clone());
        self.persist();
    }

    pub fn remove_favorite(&mut self, category: Category, mal_id: u32) {
        let favorites = self.state.favorites.get_mut(category);
        let before = favorites.len();
        favorites.retain(|item| item.mal_id != mal_id);

        if favorites.len() != before {
            self.persist();
        }
    }

    pub fn is_favorite(&self, category: Category, mal_id: u32) -> bool {
        self.favorites(category).iter().any(|i| i.mal_id == mal_id)
    }

    pub fn favorite_counts(&self) -> CategoryMap<usize> {
        self.state.favorites.map(Vec::len)
    }

    // ========== Preferences ==========

    /// Remember a query, most recent first. Repeats and empty queries are ignored.
    pub fn record_search(&mut self, query: &str) {
        if query.is_empty() || self.state.search_history.iter().any(|q| q == query) {
            return;
        }

        let history = &mut self.state.search_history;
        history.insert(0, query.to_string());
        history.truncate(SEARCH_HISTORY_LIMIT);
        self.persist();
    }

    pub fn toggle_dark_mode(&mut self) {
        self.state.dark_mode = !self.state.dark_mode;
        self.persist();
    }

    // ========== Status editor ==========

    pub fn open_status_editor(&mut self, category: Category, item: &CatalogEntry) {
        self.state.status_modal = StatusModal {
            is_open: true,
            item: Some(item.clone()),
            category: Some(category),
        };
    }

    pub fn close_status_editor(&mut self) {
        self.state.status_modal = StatusModal::default();
    }

    /// Status and progress the open editor starts from
    pub fn status_editor_defaults(&self) -> Option<TrackingData> {
        let (category, item) = self.open_editor()?;

        let existing = self
            .get_tracked_item(category, item.mal_id)
            .and_then(|i| i.tracking_data);

        Some(existing.unwrap_or(TrackingData {
            status: TrackingStatus::default_for(category),
            progress: 0,
        }))
    }

    /// Save the open editor's selection and close it.
    ///
    /// Returns the stored tracking data, or `None` when no editor is open.
    pub fn save_status_editor(
        &mut self,
        status: TrackingStatus,
        progress: u32,
    ) -> Option<TrackingData> {
        let (category, item) = self.open_editor()?;
        let item = item.clone();

        let resolved = status::resolve(
            TrackingData {
                status: status::for_category(status, category),
                progress,
            },
            item.total(category),
        );

        self.upsert_tracked_item(category, &item, resolved.into());
        self.close_status_editor();

        self.get_tracked_item(category, item.mal_id)
            .and_then(|i| i.tracking_data)
    }

    fn open_editor(&self) -> Option<(Category, &CatalogEntry)> {
        let modal = &self.state.status_modal;
        if !modal.is_open {
            return None;
        }
        Some((modal.category?, modal.item.as_ref()?))
    }

    // ========== Session flags ==========

    pub fn set_loading(&mut self, loading: bool) {
        self.state.loading = loading;
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.state.error = Some(error.into());
        self.state.loading = false;
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // ========== Persistence ==========

    /// Write the durable subset; failures are logged and otherwise ignored
    fn persist(&mut self) {
        let blob = match serde_json::to_string(&self.state.persisted()) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to serialize list data");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(&self.key, &blob) {
            warn!(key = %self.key, error = %e, "Failed to save list data");
        }
    }
}

/// Keep the first entry per `mal_id` in every list and favorites set
fn dedupe_by_identity(state: &mut AppState) {
    for category in Category::ALL {
        let mut seen = HashSet::new();
        let list = state.my_list.get_mut(category);
        let before = list.len();
        list.retain(|item| seen.insert(item.mal_id()));

        let mut seen = HashSet::new();
        let favorites = state.favorites.get_mut(category);
        let before_favorites = favorites.len();
        favorites.retain(|item| seen.insert(item.mal_id));

        let dropped = before - list.len() + before_favorites - favorites.len();
        if dropped > 0 {
            warn!(category = %category, dropped = dropped, "Dropped duplicate saved entries");
        }
    }
}

fn normalize(category: Category, data: TrackingData, total: Option<u32>) -> TrackingData {
    status::resolve(
        TrackingData {
            status: status::for_category(data.status, category),
            progress: data.progress,
        },
        total,
    )
}
