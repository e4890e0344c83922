//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use playlist_export::adapters::database::{ExportStore, InMemoryExportStore};
use playlist_export::adapters::spotify::{CatalogApi, Page, PageRequest, Resource};
use playlist_export::core::export::{
    BatchWorker, CoordinatorSettings, DispatchSettings, ExportCoordinator, ExportLayout,
    FileWriter, LocalDispatcher, TrackFetcher,
};
use playlist_export::domain::{CurrentUser, RemoteFetchError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

/// In-process catalog serving a fixed set of playlists and tracks
#[derive(Default)]
pub struct ScriptedCatalog {
    user_id: String,
    playlists: Vec<Value>,
    tracks: HashMap<String, Vec<Value>>,
    failures: Mutex<HashMap<String, usize>>,
    requests: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedCatalog {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    /// Add a playlist owned by the catalog user with `track_count` tracks
    pub fn with_playlist(mut self, id: &str, name: &str, track_count: usize) -> Self {
        self.playlists.push(json!({
            "id": id,
            "name": name,
            "owner": {"id": self.user_id, "display_name": "Test User"},
        }));
        let tracks = (0..track_count)
            .map(|i| {
                json!({
                    "added_at": "2024-05-01T10:00:00Z",
                    "track": {
                        "name": format!("Song {i}"),
                        "artists": [{"name": format!("Artist {i}")}],
                        "album": {"name": "Album"},
                        "external_urls": {"spotify": format!("https://open.spotify.com/track/{id}{i}")},
                    },
                })
            })
            .collect();
        self.tracks.insert(id.to_string(), tracks);
        self
    }

    /// Add `count` playlists named `Playlist {n}`, each with `track_count` tracks
    pub fn with_playlists(mut self, count: usize, track_count: usize) -> Self {
        for n in 0..count {
            self = self.with_playlist(&format!("pl{n:03}"), &format!("Playlist {n}"), track_count);
        }
        self
    }

    /// Make the next `times` track requests for `playlist_id` fail
    pub fn failing(self, playlist_id: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(playlist_id.to_string(), times);
        self
    }

    /// Hold every track request until a permit is added to the returned gate
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for ScriptedCatalog {
    async fn fetch_page(
        &self,
        resource: &Resource,
        page: PageRequest,
    ) -> Result<Page<Value>, RemoteFetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let items = match resource {
            Resource::MyPlaylists => &self.playlists,
            Resource::PlaylistTracks(id) => {
                if let Some(gate) = &self.gate {
                    let _permit = gate.acquire().await.map_err(|e| {
                        RemoteFetchError::ConnectionFailed(e.to_string())
                    })?;
                }
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(id.as_str()) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(RemoteFetchError::ServerError {
                            status: 502,
                            message: "bad gateway".to_string(),
                        });
                    }
                }
                self.tracks
                    .get(id.as_str())
                    .ok_or_else(|| RemoteFetchError::ClientError {
                        status: 404,
                        message: format!("no playlist {id}"),
                    })?
            }
        };

        let start = page.offset.min(items.len());
        let end = (page.offset + page.limit).min(items.len());
        Ok(Page {
            items: items[start..end].to_vec(),
            total: items.len() as u64,
        })
    }

    async fn current_user(&self) -> Result<CurrentUser, RemoteFetchError> {
        Ok(CurrentUser {
            id: self.user_id.clone(),
            display_name: Some("Test User".to_string()),
            external_urls: None,
        })
    }
}

/// A fully wired in-process pipeline over a scratch storage root
pub struct Pipeline {
    pub dir: TempDir,
    pub layout: ExportLayout,
    pub store: Arc<InMemoryExportStore>,
    pub catalog: Arc<ScriptedCatalog>,
    pub dispatcher: Arc<LocalDispatcher>,
    pub coordinator: ExportCoordinator,
}

impl Pipeline {
    pub fn new(catalog: ScriptedCatalog, batch_size: usize, max_attempts: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let layout = ExportLayout::new(dir.path());
        let store = Arc::new(InMemoryExportStore::new());
        let catalog = Arc::new(catalog);
        let api: Arc<dyn CatalogApi> = catalog.clone();
        let export_store: Arc<dyn ExportStore> = store.clone();

        let worker = Arc::new(BatchWorker::new(
            export_store.clone(),
            TrackFetcher::new(api.clone(), 2),
            FileWriter::new(),
            layout.clone(),
        ));
        let dispatcher = Arc::new(LocalDispatcher::new(
            worker,
            DispatchSettings {
                max_concurrent: 3,
                max_attempts,
                retry_delay: Duration::from_millis(1),
            },
        ));
        let coordinator = ExportCoordinator::new(
            export_store,
            api,
            dispatcher.clone(),
            layout.clone(),
            CoordinatorSettings {
                batch_size: NonZeroUsize::new(batch_size).unwrap(),
                playlist_page_limit: 10,
            },
        );

        Self {
            dir,
            layout,
            store,
            catalog,
            dispatcher,
            coordinator,
        }
    }
}

/// Names of the entries of a zip archive, in archive order
pub fn archive_entries(path: &std::path::Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one archive entry
pub fn archive_entry(path: &std::path::Path, name: &str) -> String {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}
