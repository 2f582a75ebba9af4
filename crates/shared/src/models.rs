//! Data models for the tracking list.
//!
//! This module defines the categories, catalog entries, tracking data and the
//! root application state that the store owns and persists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content kind a list entry belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Anime,
    Manga,
    Characters,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Anime, Category::Manga, Category::Characters];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anime => "anime",
            Category::Manga => "manga",
            Category::Characters => "characters",
        }
    }

    /// Whether entries of this category carry status/progress tracking.
    ///
    /// Characters are only ever added or removed, never progressed through.
    pub fn supports_tracking(&self) -> bool {
        matches!(self, Category::Anime | Category::Manga)
    }

    /// Field of the API payload that holds the episode/chapter count
    pub fn total_field(&self) -> Option<&'static str> {
        match self {
            Category::Anime => Some("episodes"),
            Category::Manga => Some("chapters"),
            Category::Characters => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(Category::Anime),
            "manga" => Ok(Category::Manga),
            "characters" | "character" => Ok(Category::Characters),
            _ => Err(anyhow::anyhow!("Invalid category: {}", s)),
        }
    }
}

/// One value per category, always all three present
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct CategoryMap<T> {
    #[serde(default)]
    pub anime: T,
    #[serde(default)]
    pub manga: T,
    #[serde(default)]
    pub characters: T,
}

impl<T> CategoryMap<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Anime => &self.anime,
            Category::Manga => &self.manga,
            Category::Characters => &self.characters,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Anime => &mut self.anime,
            Category::Manga => &mut self.manga,
            Category::Characters => &mut self.characters,
        }
    }

    /// Build a new map by applying `f` to each category's value
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> CategoryMap<U> {
        CategoryMap {
            anime: f(&self.anime),
            manga: f(&self.manga),
            characters: f(&self.characters),
        }
    }
}

/// Watch/read status of a tracked entry.
///
/// Serialized with the labels shown to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrackingStatus {
    Watching,
    Reading,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
    Dropped,
    #[serde(rename = "Plan to Watch")]
    PlanToWatch,
    #[serde(rename = "Plan to Read")]
    PlanToRead,
}

impl TrackingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrackingStatus::Watching => "Watching",
            TrackingStatus::Reading => "Reading",
            TrackingStatus::Completed => "Completed",
            TrackingStatus::OnHold => "On Hold",
            TrackingStatus::Dropped => "Dropped",
            TrackingStatus::PlanToWatch => "Plan to Watch",
            TrackingStatus::PlanToRead => "Plan to Read",
        }
    }

    /// Watching or Reading
    pub fn is_active(&self) -> bool {
        matches!(self, TrackingStatus::Watching | TrackingStatus::Reading)
    }

    /// Plan to Watch or Plan to Read
    pub fn is_planned(&self) -> bool {
        matches!(self, TrackingStatus::PlanToWatch | TrackingStatus::PlanToRead)
    }

    /// The in-progress status for a category (Watching for anime, Reading otherwise)
    pub fn active_for(category: Category) -> Self {
        match category {
            Category::Anime => TrackingStatus::Watching,
            _ => TrackingStatus::Reading,
        }
    }

    /// Status a freshly tracked entry starts with
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Anime => TrackingStatus::PlanToWatch,
            _ => TrackingStatus::PlanToRead,
        }
    }

    /// Statuses offered for a category, in display order
    pub fn options_for(category: Category) -> [TrackingStatus; 5] {
        [
            Self::active_for(category),
            TrackingStatus::Completed,
            TrackingStatus::OnHold,
            TrackingStatus::Dropped,
            Self::default_for(category),
        ]
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "watching" => Ok(TrackingStatus::Watching),
            "reading" => Ok(TrackingStatus::Reading),
            "completed" => Ok(TrackingStatus::Completed),
            "onhold" => Ok(TrackingStatus::OnHold),
            "dropped" => Ok(TrackingStatus::Dropped),
            "plantowatch" => Ok(TrackingStatus::PlanToWatch),
            "plantoread" => Ok(TrackingStatus::PlanToRead),
            _ => Err(anyhow::anyhow!("Invalid tracking status: {}", s)),
        }
    }
}

/// Status/progress pair attached to an anime or manga list entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingData {
    pub status: TrackingStatus,
    pub progress: u32,
}

/// Partial tracking update; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub status: Option<TrackingStatus>,
    pub progress: Option<u32>,
}

impl TrackingUpdate {
    pub fn status(status: TrackingStatus) -> Self {
        Self {
            status: Some(status),
            progress: None,
        }
    }

    pub fn progress(progress: u32) -> Self {
        Self {
            status: None,
            progress: Some(progress),
        }
    }

    /// Shallow merge onto existing data (or onto the category defaults)
    pub fn apply(&self, existing: Option<TrackingData>, category: Category) -> TrackingData {
        let base = existing.unwrap_or(TrackingData {
            status: TrackingStatus::default_for(category),
            progress: 0,
        });

        TrackingData {
            status: self.status.unwrap_or(base.status),
            progress: self.progress.unwrap_or(base.progress),
        }
    }
}

impl From<TrackingData> for TrackingUpdate {
    fn from(data: TrackingData) -> Self {
        Self {
            status: Some(data.status),
            progress: Some(data.progress),
        }
    }
}

/// Catalog entry as returned by the API.
///
/// Only the identity is interpreted; every other field is kept verbatim so it
/// round-trips through local storage unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub mal_id: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CatalogEntry {
    pub fn new(mal_id: u32) -> Self {
        Self {
            mal_id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Title for anime/manga, name for characters
    pub fn title(&self) -> Option<&str> {
        self.fields
            .get("title")
            .and_then(Value::as_str)
            .or_else(|| self.fields.get("name").and_then(Value::as_str))
    }

    /// Episode count (anime) or chapter count (manga), when known
    pub fn total(&self, category: Category) -> Option<u32> {
        let field = category.total_field()?;
        self.fields
            .get(field)
            .and_then(Value::as_u64)
            .filter(|total| *total > 0)
            .and_then(|total| u32::try_from(total).ok())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.fields
            .get("images")
            .and_then(|images| images.get("jpg"))
            .and_then(|jpg| jpg.get("image_url"))
            .and_then(Value::as_str)
    }
}

/// Entry of the personal list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedItem {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    #[serde(
        rename = "trackingData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_data: Option<TrackingData>,
}

impl TrackedItem {
    pub fn mal_id(&self) -> u32 {
        self.entry.mal_id
    }
}

/// Favorites carry display fields only
pub type FavoriteItem = CatalogEntry;

/// Transient state of the status editor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusModal {
    pub is_open: bool,
    pub item: Option<CatalogEntry>,
    pub category: Option<Category>,
}

/// Root state owned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub my_list: CategoryMap<Vec<TrackedItem>>,
    pub favorites: CategoryMap<Vec<FavoriteItem>>,
    pub search_history: Vec<String>,
    pub dark_mode: bool,
    pub status_modal: StatusModal,
    pub loading: bool,
    pub error: Option<String>,
}

/// Durable subset of [`AppState`], as written to local storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub my_list: CategoryMap<Vec<TrackedItem>>,
    pub favorites: CategoryMap<Vec<FavoriteItem>>,
    pub search_history: Vec<String>,
    pub dark_mode: bool,
}

/// Persisted blob as read back; any field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPatch {
    #[serde(default)]
    pub my_list: Option<CategoryMap<Vec<TrackedItem>>>,
    #[serde(default)]
    pub favorites: Option<CategoryMap<Vec<FavoriteItem>>>,
    #[serde(default)]
    pub search_history: Option<Vec<String>>,
    #[serde(default)]
    pub dark_mode: Option<bool>,
}

impl AppState {
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            my_list: self.my_list.clone(),
            favorites: self.favorites.clone(),
            search_history: self.search_history.clone(),
            dark_mode: self.dark_mode,
        }
    }

    /// Shallow merge of a persisted blob; fields present replace the current ones
    pub fn merge_persisted(&mut self, patch: PersistedPatch) {
        if let Some(my_list) = patch.my_list {
            self.my_list = my_list;
        }
        if let Some(favorites) = patch.favorites {
            self.favorites = favorites;
        }
        if let Some(search_history) = patch.search_history {
            self.search_history = search_history;
        }
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&TrackingStatus::PlanToWatch).unwrap();
        assert_eq!(json, "\"Plan to Watch\"");

        let status: TrackingStatus = serde_json::from_str("\"On Hold\"").unwrap();
        assert_eq!(status, TrackingStatus::OnHold);
    }

    #[test]
    fn test_status_from_str_is_lenient() {
        assert_eq!("plan-to-read".parse::<TrackingStatus>().unwrap(), TrackingStatus::PlanToRead);
        assert_eq!("On Hold".parse::<TrackingStatus>().unwrap(), TrackingStatus::OnHold);
        assert!("finished".parse::<TrackingStatus>().is_err());
    }

    #[test]
    fn test_category_statuses() {
        assert_eq!(TrackingStatus::active_for(Category::Anime), TrackingStatus::Watching);
        assert_eq!(TrackingStatus::active_for(Category::Manga), TrackingStatus::Reading);
        assert_eq!(TrackingStatus::default_for(Category::Manga), TrackingStatus::PlanToRead);
        assert!(!Category::Characters.supports_tracking());
    }

    #[test]
    fn test_catalog_entry_keeps_unknown_fields() {
        let value = json!({
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "episodes": 64,
            "images": { "jpg": { "image_url": "https://cdn.example/fma.jpg" } }
        });

        let entry: CatalogEntry = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(entry.mal_id, 5114);
        assert_eq!(entry.title(), Some("Fullmetal Alchemist: Brotherhood"));
        assert_eq!(entry.total(Category::Anime), Some(64));
        assert_eq!(entry.total(Category::Manga), None);
        assert_eq!(entry.image_url(), Some("https://cdn.example/fma.jpg"));
        assert_eq!(serde_json::to_value(&entry).unwrap(), value);
    }

    #[test]
    fn test_unknown_total_is_none() {
        let entry = CatalogEntry::new(1).with_field("episodes", Value::Null);
        assert_eq!(entry.total(Category::Anime), None);

        let character = CatalogEntry::new(2).with_field("name", "Edward Elric");
        assert_eq!(character.title(), Some("Edward Elric"));
    }

    #[test]
    fn test_tracked_item_json_shape() {
        let item = TrackedItem {
            entry: CatalogEntry::new(21).with_field("title", "One Piece"),
            tracking_data: Some(TrackingData {
                status: TrackingStatus::Watching,
                progress: 3,
            }),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({
                "mal_id": 21,
                "title": "One Piece",
                "trackingData": { "status": "Watching", "progress": 3 }
            })
        );

        let parsed: TrackedItem = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, item);
        assert!(!parsed.entry.fields.contains_key("trackingData"));
    }

    #[test]
    fn test_tracking_update_merges_shallowly() {
        let existing = TrackingData {
            status: TrackingStatus::Watching,
            progress: 4,
        };

        let merged = TrackingUpdate::progress(5).apply(Some(existing), Category::Anime);
        assert_eq!(merged.status, TrackingStatus::Watching);
        assert_eq!(merged.progress, 5);

        let fresh = TrackingUpdate::default().apply(None, Category::Manga);
        assert_eq!(fresh.status, TrackingStatus::PlanToRead);
        assert_eq!(fresh.progress, 0);
    }

    #[test]
    fn test_partial_patch_fills_missing_categories() {
        let patch: PersistedPatch = serde_json::from_value(json!({
            "myList": { "anime": [{ "mal_id": 1, "title": "Cowboy Bebop" }] },
            "darkMode": true
        }))
        .unwrap();

        let mut state = AppState::default();
        state.search_history.push("bebop".to_string());
        state.merge_persisted(patch);

        assert_eq!(state.my_list.anime.len(), 1);
        assert!(state.my_list.manga.is_empty());
        assert!(state.my_list.characters.is_empty());
        assert!(state.dark_mode);
        assert_eq!(state.search_history, vec!["bebop".to_string()]);
    }
}
