//! Catalog API adapter
//!
//! [`CatalogApi`] is the seam between the export pipeline and the remote music
//! catalog. The pipeline only needs offset-paged reads of two resources plus the
//! identity of the authenticated user; [`SpotifyClient`] is the production
//! implementation and tests substitute scripted fakes.

pub mod client;

pub use client::SpotifyClient;

use crate::domain::ids::PlaylistId;
use crate::domain::{CurrentUser, RemoteFetchError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// A paged collection on the catalog API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Playlists owned or followed by the authenticated user
    MyPlaylists,
    /// Track entries of one playlist
    PlaylistTracks(PlaylistId),
}

impl Resource {
    /// Path of the resource relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Resource::MyPlaylists => "/me/playlists".to_string(),
            Resource::PlaylistTracks(id) => format!("/playlists/{id}/tracks"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::MyPlaylists => write!(f, "my playlists"),
            Resource::PlaylistTracks(id) => write!(f, "tracks of playlist {id}"),
        }
    }
}

/// Offset/limit window of a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items to return
    pub limit: usize,
    /// Index of the first item
    pub offset: usize,
}

/// One page of a collection together with the server-reported total
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    /// Items in this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Size of the whole collection at the time of the request
    #[serde(default)]
    pub total: u64,
}

/// Read access to the catalog
///
/// Implementations apply their own retry policy; an error returned from here is
/// final for the current unit of work.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one page of `resource`
    async fn fetch_page(
        &self,
        resource: &Resource,
        page: PageRequest,
    ) -> Result<Page<Value>, RemoteFetchError>;

    /// The authenticated user
    async fn current_user(&self) -> Result<CurrentUser, RemoteFetchError>;
}
