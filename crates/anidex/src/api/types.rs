//! Jikan API v4 response types.
//!
//! Catalog entries stay opaque ([`CatalogEntry`]) so their display fields pass
//! through to the list store untouched; only the envelopes are typed.

use serde::{Deserialize, Serialize};
use shared::CatalogEntry;

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Whether another page can be requested; false when pagination is absent
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .map(|p| p.has_next_page)
            .unwrap_or(false)
    }
}

/// Simple data wrapper (without pagination)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Single-resource response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Single<T> {
    pub data: T,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub last_visible_page: Option<u32>,
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

/// Genre list item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: u32,
    pub name: String,
    pub url: String,
    pub count: u32,
}

/// Character appearing in an anime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRole {
    pub character: CatalogEntry,
    pub role: String,
}

/// Recommended entry for an anime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub entry: CatalogEntry,
    #[serde(default)]
    pub votes: u32,
}

/// Error body returned by Jikan with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
