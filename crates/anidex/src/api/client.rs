//! Typed Jikan client on top of the request queue.

use super::error::JikanError;
use super::queue::{RequestQueue, RequestSpec};
use super::transport::HttpTransport;
use super::types::*;
use serde::de::DeserializeOwned;
use shared::config::JikanConfig;
use shared::{CatalogEntry, Category};
use std::future::Future;
use tracing::{debug, info};

/// Extra query parameters (filters, ordering, limits)
pub type Params = [(String, String)];

/// Jikan API v4 client
#[derive(Clone)]
pub struct JikanClient {
    queue: RequestQueue,
}

impl JikanClient {
    /// Create a client that shares an existing queue
    pub fn new(queue: RequestQueue) -> Self {
        Self { queue }
    }

    /// Create a client with its own HTTP queue (requires a tokio runtime)
    pub fn from_config(config: &JikanConfig) -> Result<Self, JikanError> {
        let transport = HttpTransport::new(&config.base_url, config.timeout(), &config.user_agent)
            .map_err(|e| JikanError::Queue(e.into()))?;

        info!(
            base_url = %config.base_url,
            interval_ms = config.request_interval_ms,
            "Jikan client ready"
        );
        Ok(Self::new(RequestQueue::new(transport, config.request_interval())))
    }

    /// Queue a GET and decode its body.
    ///
    /// The request is queued immediately, so calls keep their call order even
    /// if the returned futures are awaited in a different order.
    fn get<T>(&self, spec: RequestSpec) -> impl Future<Output = Result<T, JikanError>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        debug!(path = %spec.path, "Queueing API request");
        let pending = self.queue.enqueue(spec);

        async move {
            let raw = pending.await?;
            Ok(raw.json::<T>()?)
        }
    }

    fn get_one(&self, spec: RequestSpec) -> impl Future<Output = Result<CatalogEntry, JikanError>> + Send {
        let pending = self.get::<Single<CatalogEntry>>(spec);
        async move { Ok(pending.await?.data) }
    }

    fn get_list<T>(&self, spec: RequestSpec) -> impl Future<Output = Result<Vec<T>, JikanError>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        let pending = self.get::<DataResponse<T>>(spec);
        async move { Ok(pending.await?.data) }
    }

    // ========== Anime ==========

    /// Top anime; `filter` is one of airing, upcoming, bypopularity, favorites
    pub fn top_anime(
        &self,
        page: u32,
        filter: &str,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(
            RequestSpec::get("/top/anime")
                .param("page", page)
                .param("filter", filter),
        )
    }

    pub fn anime_characters(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<CharacterRole>, JikanError>> + Send {
        self.get_list(RequestSpec::get(format!("/anime/{}/characters", id)))
    }

    pub fn anime_recommendations(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Vec<Recommendation>, JikanError>> + Send {
        self.get_list(RequestSpec::get(format!("/anime/{}/recommendations", id)))
    }

    // ========== Manga ==========

    pub fn top_manga(
        &self,
        page: u32,
        params: &Params,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(RequestSpec::get("/top/manga").param("page", page).params(params))
    }

    // ========== Characters ==========

    pub fn search_characters(
        &self,
        query: &str,
        page: u32,
        filters: &Params,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(search_spec("/characters", query, page, filters))
    }

    // ========== Genres & seasons ==========

    pub fn anime_genres(&self) -> impl Future<Output = Result<Vec<Genre>, JikanError>> + Send {
        self.get_list(RequestSpec::get("/genres/anime"))
    }

    pub fn manga_genres(&self) -> impl Future<Output = Result<Vec<Genre>, JikanError>> + Send {
        self.get_list(RequestSpec::get("/genres/manga"))
    }

    pub fn current_season(
        &self,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(RequestSpec::get("/seasons/now"))
    }

    pub fn upcoming_season(
        &self,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(RequestSpec::get("/seasons/upcoming"))
    }

    // ========== By category ==========

    /// Full details of an entry of any category
    pub fn details(
        &self,
        category: Category,
        id: u32,
    ) -> impl Future<Output = Result<CatalogEntry, JikanError>> + Send {
        self.get_one(RequestSpec::get(format!("/{}/{}/full", category.as_str(), id)))
    }

    /// Search any category
    pub fn search(
        &self,
        category: Category,
        query: &str,
        page: u32,
        filters: &Params,
    ) -> impl Future<Output = Result<Page<CatalogEntry>, JikanError>> + Send {
        self.get(search_spec(&format!("/{}", category.as_str()), query, page, filters))
    }
}

fn search_spec(path: &str, query: &str, page: u32, filters: &Params) -> RequestSpec {
    RequestSpec::get(path)
        .param("q", query)
        .param("page", page)
        .params(filters)
}
