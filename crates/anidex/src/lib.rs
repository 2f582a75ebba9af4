//! anidex library: rate-limited access to the Jikan API.
//!
//! This library provides the request queue, a typed client for the catalog
//! endpoints and helpers for incremental page loading. The tracking list
//! itself lives in the `shared` crate.

pub mod api;
pub mod pager;

pub use api::{JikanClient, JikanError, RequestQueue, RequestSpec};
pub use pager::{collect_pages, Pager};
