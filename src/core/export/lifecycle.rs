//! Owner-facing export operations: listing, deletion, download, finalization retry
//!
//! Every operation on a single export checks that the caller owns it.

use super::archive::{Archiver, PublishedArchive};
use super::layout::ExportLayout;
use super::worker::finalize_export;
use crate::adapters::database::ExportStore;
use crate::domain::ids::{ExportId, OwnerId};
use crate::domain::{Export, ExportError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress view of one export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStatusView {
    /// Export id
    pub id: ExportId,
    /// Folder name on disk
    pub folder_name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether the archive has been published
    pub finished: bool,
    /// Playlists found
    pub playlist_count: u64,
    /// Playlists written
    pub playlists_exported: u64,
    /// Batches dispatched
    pub total_batches: u64,
    /// Batches completed
    pub completed_batches: u64,
    /// `playlists_exported / playlist_count` as a percentage
    pub playlist_progress_pct: f64,
    /// `completed_batches / total_batches` as a percentage
    pub batch_progress_pct: f64,
    /// Whether the archive file is present
    pub archive_available: bool,
}

impl ExportStatusView {
    fn new(export: &Export, archive_available: bool) -> Self {
        Self {
            id: export.id,
            folder_name: export.folder_name.clone(),
            created_at: export.created_at,
            finished: export.finished,
            playlist_count: export.playlist_count,
            playlists_exported: export.playlists_exported,
            total_batches: export.total_batches,
            completed_batches: export.completed_batches,
            playlist_progress_pct: export.playlist_progress_pct(),
            batch_progress_pct: export.batch_progress_pct(),
            archive_available,
        }
    }
}

/// A finished archive ready to hand to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDownload {
    /// Archive on disk
    pub path: PathBuf,
    /// Suggested file name for the download
    pub download_name: String,
}

/// Download file name for an export created at `created_at`
pub fn download_name_for(created_at: DateTime<Utc>) -> String {
    format!(
        "spotify-playlists-{}.zip",
        created_at.format("%Y%m%d_%H%M%S")
    )
}

/// Listing, deletion and download of exports
pub struct ExportLifecycle {
    store: Arc<dyn ExportStore>,
    layout: ExportLayout,
}

impl ExportLifecycle {
    /// Create the service
    pub fn new(store: Arc<dyn ExportStore>, layout: ExportLayout) -> Self {
        Self { store, layout }
    }

    /// All exports of `owner_id`, newest first
    pub async fn list_exports(&self, owner_id: &OwnerId) -> Result<Vec<ExportStatusView>> {
        let exports = self.store.list_for_owner(owner_id).await?;
        Ok(exports
            .iter()
            .map(|export| {
                let available = self.layout.archive_path(&export.folder_name).is_file();
                ExportStatusView::new(export, available)
            })
            .collect())
    }

    /// Delete an export together with its files
    ///
    /// Removes the archive, any stale partial archive and any remaining working
    /// directory, then the record. If a file cannot be removed the record is kept
    /// so the deletion can be repeated.
    ///
    /// # Errors
    ///
    /// [`ExportError::NotFound`] for an unknown id, [`ExportError::PermissionDenied`]
    /// if `owner_id` does not own the export, [`ExportError::Io`] if a file could
    /// not be removed.
    pub async fn delete_export(&self, owner_id: &OwnerId, id: ExportId) -> Result<()> {
        let export = self.owned(owner_id, id).await?;

        remove_file_if_exists(&self.layout.archive_path(&export.folder_name)).await?;
        remove_file_if_exists(&self.layout.partial_archive_path(&export.folder_name)).await?;
        remove_dir_if_exists(&self.layout.working_dir(&export.folder_name)).await?;

        self.store.delete(id).await?;

        tracing::info!(
            export_id = %id,
            folder_name = %export.folder_name,
            "Export deleted"
        );
        Ok(())
    }

    /// Locate the archive of a finished export
    ///
    /// # Errors
    ///
    /// [`ExportError::NotFound`] if the export or its archive does not exist,
    /// [`ExportError::PermissionDenied`] if `owner_id` does not own it.
    pub async fn locate_archive(&self, owner_id: &OwnerId, id: ExportId) -> Result<ArchiveDownload> {
        let export = self.owned(owner_id, id).await?;
        let path = self.layout.archive_path(&export.folder_name);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExportError::NotFound(format!(
                "archive for export {id} is not available"
            )));
        }

        Ok(ArchiveDownload {
            path,
            download_name: download_name_for(export.created_at),
        })
    }

    /// Retry finalization of an export whose batches all completed but whose
    /// archive was never published
    ///
    /// # Errors
    ///
    /// [`ExportError::Validation`] if the export is already finished or still has
    /// outstanding batches, otherwise whatever finalization returns.
    pub async fn retry_finalization(
        &self,
        owner_id: &OwnerId,
        id: ExportId,
    ) -> Result<PublishedArchive> {
        let export = self.owned(owner_id, id).await?;

        if export.finished {
            return Err(ExportError::Validation(format!(
                "export {id} is already finished"
            )));
        }
        if export.completed_batches != export.total_batches {
            return Err(ExportError::Validation(format!(
                "export {id} has {} of {} batches completed",
                export.completed_batches, export.total_batches
            )));
        }

        let archiver = Archiver::new(self.layout.clone());
        finalize_export(self.store.as_ref(), &archiver, id, &export.folder_name).await
    }

    async fn owned(&self, owner_id: &OwnerId, id: ExportId) -> Result<Export> {
        let export = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;

        if &export.owner_id != owner_id {
            tracing::warn!(export_id = %id, owner_id = %owner_id, "Export owned by another user");
            return Err(ExportError::PermissionDenied(format!(
                "export {id} belongs to another user"
            )));
        }

        Ok(export)
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::Io(format!(
            "Failed to remove {}: {e}",
            path.display()
        ))),
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::Io(format!(
            "Failed to remove {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::InMemoryExportStore;
    use crate::domain::NewExport;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: Arc<InMemoryExportStore>,
        layout: ExportLayout,
        lifecycle: ExportLifecycle,
        owner: OwnerId,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let layout = ExportLayout::new(dir.path());
        std::fs::create_dir_all(layout.root()).unwrap();
        let store = Arc::new(InMemoryExportStore::new());
        let lifecycle = ExportLifecycle::new(store.clone(), layout.clone());
        Fixture {
            _dir: dir,
            store,
            layout,
            lifecycle,
            owner: OwnerId::new("42").unwrap(),
        }
    }

    async fn create(fx: &Fixture, folder: &str, playlists: u64, batches: u64) -> Export {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let export = fx
            .store
            .create(NewExport::new(fx.owner.clone(), folder.to_string(), created_at))
            .await
            .unwrap();
        fx.store.set_playlist_count(export.id, playlists).await.unwrap();
        fx.store.set_total_batches(export.id, batches).await.unwrap();
        export
    }

    #[test]
    fn test_download_name() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            download_name_for(created_at),
            "spotify-playlists-20240309_140507.zip"
        );
    }

    #[tokio::test]
    async fn test_list_reports_progress() {
        let fx = fixture();
        let export = create(&fx, "42-a", 4, 2).await;
        fx.store.increment_playlists_exported(export.id).await.unwrap();
        fx.store.increment_completed_batches(export.id).await.unwrap();

        let views = fx.lifecycle.list_exports(&fx.owner).await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].playlist_progress_pct, 25.0);
        assert_eq!(views[0].batch_progress_pct, 50.0);
        assert!(!views[0].archive_available);
    }

    #[tokio::test]
    async fn test_delete_removes_files_and_record() {
        let fx = fixture();
        let export = create(&fx, "42-b", 1, 1).await;
        std::fs::write(fx.layout.archive_path("42-b"), b"zip").unwrap();
        std::fs::write(fx.layout.partial_archive_path("42-b"), b"partial").unwrap();
        std::fs::create_dir_all(fx.layout.working_dir("42-b")).unwrap();
        std::fs::write(fx.layout.working_dir("42-b").join("x.json"), b"{}").unwrap();

        fx.lifecycle.delete_export(&fx.owner, export.id).await.unwrap();

        assert!(!fx.layout.archive_path("42-b").exists());
        assert!(!fx.layout.partial_archive_path("42-b").exists());
        assert!(!fx.layout.working_dir("42-b").exists());
        assert!(fx.store.get(export.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_without_files_succeeds() {
        let fx = fixture();
        let export = create(&fx, "42-c", 0, 0).await;

        fx.lifecycle.delete_export(&fx.owner, export.id).await.unwrap();
        assert!(fx.store.get(export.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_owner_is_denied() {
        let fx = fixture();
        let export = create(&fx, "42-d", 0, 0).await;
        std::fs::write(fx.layout.archive_path("42-d"), b"zip").unwrap();
        let intruder = OwnerId::new("7").unwrap();

        let deleted = fx.lifecycle.delete_export(&intruder, export.id).await;
        let located = fx.lifecycle.locate_archive(&intruder, export.id).await;

        assert!(matches!(deleted, Err(ExportError::PermissionDenied(_))));
        assert!(matches!(located, Err(ExportError::PermissionDenied(_))));
        assert!(fx.layout.archive_path("42-d").exists());
        assert!(fx.store.get(export.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_locate_archive() {
        let fx = fixture();
        let export = create(&fx, "42-e", 0, 0).await;

        let missing = fx.lifecycle.locate_archive(&fx.owner, export.id).await;
        assert!(matches!(missing, Err(ExportError::NotFound(_))));

        std::fs::write(fx.layout.archive_path("42-e"), b"zip").unwrap();
        let download = fx.lifecycle.locate_archive(&fx.owner, export.id).await.unwrap();
        assert_eq!(download.path, fx.layout.archive_path("42-e"));
        assert_eq!(download.download_name, "spotify-playlists-20240309_140507.zip");
    }

    #[tokio::test]
    async fn test_unknown_export_is_not_found() {
        let fx = fixture();
        let result = fx.lifecycle.delete_export(&fx.owner, ExportId::generate()).await;
        assert!(matches!(result, Err(ExportError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_retry_finalization() {
        let fx = fixture();
        let export = create(&fx, "42-f", 1, 1).await;
        std::fs::create_dir_all(fx.layout.working_dir("42-f")).unwrap();
        std::fs::write(fx.layout.working_dir("42-f").join("a.csv"), b"Artist").unwrap();

        let outstanding = fx.lifecycle.retry_finalization(&fx.owner, export.id).await;
        assert!(matches!(outstanding, Err(ExportError::Validation(_))));

        fx.store.increment_completed_batches(export.id).await.unwrap();
        let archive = fx
            .lifecycle
            .retry_finalization(&fx.owner, export.id)
            .await
            .unwrap();

        assert_eq!(archive.entries, 1);
        assert!(fx.store.get(export.id).await.unwrap().unwrap().finished);

        let again = fx.lifecycle.retry_finalization(&fx.owner, export.id).await;
        assert!(matches!(again, Err(ExportError::Validation(_))));
    }
}
