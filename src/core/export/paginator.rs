//! Offset pagination over catalog collections
//!
//! The offset starts at 0 and advances by the page limit. Paging stops once the
//! number of items collected reaches the total reported by the most recent page,
//! so a collection that shrinks between requests still terminates. A page that
//! comes back empty while items are still missing also ends the sequence.

use crate::adapters::spotify::{CatalogApi, PageRequest, Resource};
use crate::domain::RemoteFetchError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Lazy page sequence over one resource
///
/// Nothing is fetched until [`next_page`](Self::next_page) is called, and
/// [`restart`](Self::restart) rewinds to the first page.
pub struct Paginator<'a> {
    api: &'a dyn CatalogApi,
    resource: Resource,
    limit: usize,
    offset: usize,
    collected: u64,
    total: Option<u64>,
    exhausted: bool,
}

impl<'a> Paginator<'a> {
    /// Create a paginator requesting `limit` items per page
    pub fn new(api: &'a dyn CatalogApi, resource: Resource, limit: usize) -> Self {
        Self {
            api,
            resource,
            limit: limit.max(1),
            offset: 0,
            collected: 0,
            total: None,
            exhausted: false,
        }
    }

    /// Total reported by the last page, if any page has been fetched
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        self.offset = 0;
        self.collected = 0;
        self.total = None;
        self.exhausted = false;
    }

    /// Fetch the next page, or `None` once the collection is exhausted
    ///
    /// # Errors
    ///
    /// Returns the client's [`RemoteFetchError`] unchanged. No retries happen here.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, RemoteFetchError> {
        if self.exhausted {
            return Ok(None);
        }

        let request = PageRequest {
            limit: self.limit,
            offset: self.offset,
        };
        let page = self.api.fetch_page(&self.resource, request).await?;

        let received = page.items.len() as u64;
        self.collected += received;
        self.total = Some(page.total);
        self.offset += self.limit;

        if self.collected >= page.total {
            self.exhausted = true;
        } else if received == 0 {
            tracing::warn!(
                resource = %self.resource,
                collected = self.collected,
                total = page.total,
                "Empty page before reaching reported total, stopping"
            );
            self.exhausted = true;
        }

        Ok(Some(page.items))
    }

    /// Drain every remaining page and deserialize the items
    ///
    /// `null` entries are skipped.
    pub async fn collect_all<T: DeserializeOwned>(mut self) -> Result<Vec<T>, RemoteFetchError> {
        let mut items = Vec::new();

        while let Some(page) = self.next_page().await? {
            for value in page {
                if value.is_null() {
                    tracing::debug!(resource = %self.resource, "Skipping null item");
                    continue;
                }
                let item = serde_json::from_value(value).map_err(|e| {
                    RemoteFetchError::InvalidResponse(format!(
                        "Unexpected item in {}: {e}",
                        self.resource
                    ))
                })?;
                items.push(item);
            }
        }

        tracing::debug!(
            resource = %self.resource,
            count = items.len(),
            "Collected all pages"
        );

        Ok(items)
    }
}

/// Fetch every item of `resource`
pub async fn fetch_all<T: DeserializeOwned>(
    api: &dyn CatalogApi,
    resource: Resource,
    limit: usize,
) -> Result<Vec<T>, RemoteFetchError> {
    Paginator::new(api, resource, limit).collect_all().await
}
