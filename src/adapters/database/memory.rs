//! In-process export store
//!
//! Records live in a `HashMap` behind a `tokio::sync::RwLock`. Each counter update
//! holds the write lock for the increment and the read of its result, which gives
//! the same guarantee as an `UPDATE ... RETURNING` statement. Records do not
//! outlive the process.

use super::traits::ExportStore;
use crate::domain::ids::{ExportId, OwnerId};
use crate::domain::{BatchProgress, Export, ExportError, NewExport, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Export store backed by process memory
#[derive(Default)]
pub struct InMemoryExportStore {
    exports: RwLock<HashMap<ExportId, Export>>,
}

impl InMemoryExportStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<T>(&self, id: ExportId, f: impl FnOnce(&mut Export) -> T) -> Result<T> {
        let mut exports = self.exports.write().await;
        let export = exports
            .get_mut(&id)
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;
        Ok(f(export))
    }
}

#[async_trait]
impl ExportStore for InMemoryExportStore {
    async fn create(&self, new_export: NewExport) -> Result<Export> {
        let mut exports = self.exports.write().await;
        if exports
            .values()
            .any(|e| e.folder_name == new_export.folder_name)
        {
            return Err(ExportError::Validation(format!(
                "folder name already in use: {}",
                new_export.folder_name
            )));
        }

        let export = new_export.into_export();
        exports.insert(export.id, export.clone());
        Ok(export)
    }

    async fn get(&self, id: ExportId) -> Result<Option<Export>> {
        Ok(self.exports.read().await.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Export>> {
        let exports = self.exports.read().await;
        let mut owned: Vec<Export> = exports
            .values()
            .filter(|e| &e.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn set_playlist_count(&self, id: ExportId, playlist_count: u64) -> Result<()> {
        self.update(id, |e| e.playlist_count = playlist_count).await
    }

    async fn set_total_batches(&self, id: ExportId, total_batches: u64) -> Result<()> {
        self.update(id, |e| e.total_batches = total_batches).await
    }

    async fn increment_playlists_exported(&self, id: ExportId) -> Result<u64> {
        self.update(id, |e| {
            e.playlists_exported = (e.playlists_exported + 1).min(e.playlist_count);
            e.playlists_exported
        })
        .await
    }

    async fn increment_completed_batches(&self, id: ExportId) -> Result<Option<BatchProgress>> {
        self.update(id, |e| {
            if e.completed_batches >= e.total_batches {
                return None;
            }
            e.completed_batches += 1;
            Some(BatchProgress {
                completed: e.completed_batches,
                total: e.total_batches,
            })
        })
        .await
    }

    async fn mark_finished(&self, id: ExportId) -> Result<bool> {
        self.update(id, |e| {
            if e.finished || e.completed_batches != e.total_batches {
                return false;
            }
            e.finished = true;
            true
        })
        .await
    }

    async fn delete(&self, id: ExportId) -> Result<bool> {
        Ok(self.exports.write().await.remove(&id).is_some())
    }
}
