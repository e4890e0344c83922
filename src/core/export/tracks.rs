//! Track list resolution for a single playlist

use super::paginator::fetch_all;
use crate::adapters::spotify::{CatalogApi, Resource};
use crate::domain::ids::PlaylistId;
use crate::domain::{RemoteFetchError, TrackItem};
use std::sync::Arc;

/// Maximum page size of the playlist tracks endpoint
pub const MAX_TRACK_PAGE_LIMIT: usize = 100;

/// Fetches the complete track list of a playlist
///
/// Holds no per-playlist state, so one fetcher can serve concurrent batches.
#[derive(Clone)]
pub struct TrackFetcher {
    api: Arc<dyn CatalogApi>,
    page_limit: usize,
}

impl TrackFetcher {
    /// Create a fetcher using `page_limit` items per request
    pub fn new(api: Arc<dyn CatalogApi>, page_limit: usize) -> Self {
        Self {
            api,
            page_limit: page_limit.clamp(1, MAX_TRACK_PAGE_LIMIT),
        }
    }

    /// Every track entry of `playlist_id`, in playlist order
    pub async fn tracks_for(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<Vec<TrackItem>, RemoteFetchError> {
        let tracks: Vec<TrackItem> = fetch_all(
            self.api.as_ref(),
            Resource::PlaylistTracks(playlist_id.clone()),
            self.page_limit,
        )
        .await?;

        tracing::debug!(
            playlist_id = %playlist_id,
            track_count = tracks.len(),
            "Fetched playlist tracks"
        );

        Ok(tracks)
    }
}
