//! Incremental page loading driven by `pagination.has_next_page`.

use crate::api::{JikanError, Page};
use std::future::Future;
use tracing::debug;

/// Cursor over the pages of one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    next_page: u32,
    has_more: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}

impl Pager {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(page: u32) -> Self {
        Self {
            next_page: page.max(1),
            has_more: true,
        }
    }

    /// Page to request next, or `None` once the listing is exhausted
    pub fn next_page(&self) -> Option<u32> {
        self.has_more.then_some(self.next_page)
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Advance past a loaded page
    pub fn record<T>(&mut self, page: &Page<T>) {
        match self.next_page.checked_add(1) {
            Some(next) => {
                self.has_more = page.has_next_page();
                self.next_page = next;
            }
            None => self.has_more = false,
        }
    }
}

/// Load up to `max_pages` pages, stopping early when the listing runs out
pub async fn collect_pages<T, F, Fut>(
    pager: &mut Pager,
    max_pages: u32,
    mut fetch: F,
) -> Result<Vec<T>, JikanError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, JikanError>>,
{
    let mut items = Vec::new();

    for _ in 0..max_pages {
        let Some(page_number) = pager.next_page() else {
            break;
        };

        let page = fetch(page_number).await?;
        debug!(
            page = page_number,
            items = page.data.len(),
            has_next_page = page.has_next_page(),
            "Loaded page"
        );

        pager.record(&page);
        items.extend(page.data);
    }

    Ok(items)
}
