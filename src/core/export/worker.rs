//! Batch worker and export finalization
//!
//! A worker processes the playlists of one batch in order, then increments the
//! export's completed batch counter. The increment returns the post-increment
//! counters atomically, so exactly one worker observes
//! `completed_batches == total_batches`. That worker archives the export and
//! marks it finished.

use super::archive::{Archiver, PublishedArchive};
use super::dispatch::BatchJob;
use super::layout::ExportLayout;
use super::tracks::TrackFetcher;
use super::writer::FileWriter;
use crate::adapters::database::ExportStore;
use crate::domain::ids::ExportId;
use crate::domain::{BatchProgress, ExportError, Result};
use crate::log_batch_complete;
use std::sync::Arc;

/// Result of running one batch job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch was counted and other batches are still outstanding
    Completed(BatchProgress),
    /// The batch was the last one; this worker published the archive
    Finalized {
        /// Counters after the final increment
        progress: BatchProgress,
        /// Published archive
        archive: PublishedArchive,
    },
    /// Every batch had already been counted; this was a repeated delivery
    AlreadyCounted,
}

/// Processes one batch of playlists end to end
pub struct BatchWorker {
    store: Arc<dyn ExportStore>,
    tracks: TrackFetcher,
    writer: FileWriter,
    archiver: Archiver,
    layout: ExportLayout,
}

impl BatchWorker {
    /// Create a worker
    pub fn new(
        store: Arc<dyn ExportStore>,
        tracks: TrackFetcher,
        writer: FileWriter,
        layout: ExportLayout,
    ) -> Self {
        Self {
            store,
            tracks,
            writer,
            archiver: Archiver::new(layout.clone()),
            layout,
        }
    }

    /// Run `job`
    ///
    /// Any failure aborts the batch before `completed_batches` is incremented and
    /// is returned to the dispatcher.
    pub async fn run(&self, job: &BatchJob) -> Result<BatchOutcome> {
        self.resume(job, &mut 0).await
    }

    /// Run `job`, skipping its first `*counted` playlists
    ///
    /// Those playlists were written and counted by an earlier attempt of the same
    /// job. `*counted` advances with every playlist this attempt counts, so a
    /// caller that retries after a failure passes it back in unchanged and no
    /// playlist is counted twice.
    pub async fn resume(&self, job: &BatchJob, counted: &mut usize) -> Result<BatchOutcome> {
        match self.process(job, counted).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(
                    export_id = %job.export_id,
                    batch_index = job.batch_index,
                    playlists_counted = *counted,
                    error = %e,
                    "Batch failed"
                );
                Err(e)
            }
        }
    }

    async fn process(&self, job: &BatchJob, counted: &mut usize) -> Result<BatchOutcome> {
        let export = self
            .store
            .get(job.export_id)
            .await?
            .ok_or_else(|| ExportError::NotFound(job.export_id.to_string()))?;
        if export.finished || export.completed_batches >= export.total_batches {
            tracing::warn!(
                export_id = %job.export_id,
                batch_index = job.batch_index,
                "Export already complete, ignoring repeated delivery"
            );
            return Ok(BatchOutcome::AlreadyCounted);
        }

        let working_dir = self.layout.working_dir(&job.folder_name);

        tracing::info!(
            export_id = %job.export_id,
            batch_index = job.batch_index,
            batch_size = job.playlists.len(),
            resumed_at = *counted,
            "Processing batch"
        );

        for playlist in job.playlists.iter().skip(*counted) {
            let tracks = self.tracks.tracks_for(&playlist.id).await?;
            self.writer.write(&working_dir, playlist, &tracks).await?;
            let exported = self
                .store
                .increment_playlists_exported(job.export_id)
                .await?;
            *counted += 1;

            tracing::debug!(
                export_id = %job.export_id,
                playlist_id = %playlist.id,
                playlists_exported = exported,
                "Playlist exported"
            );
        }

        let progress = match self
            .store
            .increment_completed_batches(job.export_id)
            .await?
        {
            Some(progress) => progress,
            None => {
                tracing::warn!(
                    export_id = %job.export_id,
                    batch_index = job.batch_index,
                    "All batches already counted, ignoring repeated delivery"
                );
                return Ok(BatchOutcome::AlreadyCounted);
            }
        };

        log_batch_complete!(job.export_id, progress.completed, progress.total);

        if !progress.is_last() {
            return Ok(BatchOutcome::Completed(progress));
        }

        tracing::info!(
            export_id = %job.export_id,
            batch_index = job.batch_index,
            "Last batch completed, finalizing export"
        );
        let archive = finalize_export(
            self.store.as_ref(),
            &self.archiver,
            job.export_id,
            &job.folder_name,
        )
        .await?;

        Ok(BatchOutcome::Finalized { progress, archive })
    }
}

/// Archive the export's working directory, then mark the export finished
///
/// Called once per export: by the worker that completed the last batch, or by the
/// coordinator when there are no batches. If archiving fails the export stays
/// unfinished and its working directory stays on disk.
///
/// # Errors
///
/// Returns [`ExportError::Archival`] if the archive could not be published, and
/// [`ExportError::InvariantViolation`] if the record refuses the transition to
/// finished, which means a second finisher exists.
pub async fn finalize_export(
    store: &dyn ExportStore,
    archiver: &Archiver,
    export_id: ExportId,
    folder_name: &str,
) -> Result<PublishedArchive> {
    let archive = archiver.archive(folder_name).await.map_err(|e| {
        tracing::error!(
            export_id = %export_id,
            folder_name = %folder_name,
            error = %e,
            "Archival failed, working directory kept for retry"
        );
        ExportError::from(e)
    })?;

    if !store.mark_finished(export_id).await? {
        tracing::error!(export_id = %export_id, "Export could not be marked finished");
        return Err(ExportError::InvariantViolation(format!(
            "export {export_id} was already finished or has outstanding batches"
        )));
    }

    tracing::info!(
        export_id = %export_id,
        archive = %archive.path.display(),
        "Export finished"
    );

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::InMemoryExportStore;
    use crate::adapters::spotify::{CatalogApi, Page, PageRequest, Resource};
    use crate::domain::ids::{OwnerId, PlaylistId};
    use crate::domain::{CurrentUser, NewExport, Playlist, PlaylistOwner, RemoteFetchError};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct OneTrackApi {
        fail_playlist: Option<String>,
    }

    #[async_trait]
    impl CatalogApi for OneTrackApi {
        async fn fetch_page(
            &self,
            resource: &Resource,
            _page: PageRequest,
        ) -> std::result::Result<Page<Value>, RemoteFetchError> {
            if let Resource::PlaylistTracks(id) = resource {
                if self.fail_playlist.as_deref() == Some(id.as_str()) {
                    return Err(RemoteFetchError::ConnectionFailed("reset".to_string()));
                }
            }
            Ok(Page {
                items: vec![json!({"added_at": "2024-01-01T00:00:00Z", "track": {"name": "t"}})],
                total: 1,
            })
        }

        async fn current_user(&self) -> std::result::Result<CurrentUser, RemoteFetchError> {
            Ok(CurrentUser {
                id: "42".to_string(),
                display_name: None,
                external_urls: None,
            })
        }
    }

    fn playlist(id: &str) -> Playlist {
        Playlist {
            id: PlaylistId::new(id).unwrap(),
            name: format!("List {id}"),
            owner: PlaylistOwner {
                id: "42".to_string(),
                display_name: None,
            },
        }
    }

    struct Fixture {
        _dir: TempDir,
        store: Arc<InMemoryExportStore>,
        layout: ExportLayout,
        export_id: ExportId,
        folder_name: String,
    }

    async fn fixture(playlists: u64, batches: u64) -> Fixture {
        let dir = TempDir::new().unwrap();
        let layout = ExportLayout::new(dir.path());
        let store = Arc::new(InMemoryExportStore::new());
        let folder_name = "42-20240101000000000".to_string();
        let export = store
            .create(NewExport::new(
                OwnerId::new("42").unwrap(),
                folder_name.clone(),
                Utc::now(),
            ))
            .await
            .unwrap();
        store.set_playlist_count(export.id, playlists).await.unwrap();
        store.set_total_batches(export.id, batches).await.unwrap();
        std::fs::create_dir_all(layout.working_dir(&folder_name)).unwrap();

        Fixture {
            _dir: dir,
            store,
            layout,
            export_id: export.id,
            folder_name,
        }
    }

    fn worker(fx: &Fixture, fail_playlist: Option<&str>) -> BatchWorker {
        let api: Arc<dyn CatalogApi> = Arc::new(OneTrackApi {
            fail_playlist: fail_playlist.map(String::from),
        });
        BatchWorker::new(
            fx.store.clone(),
            TrackFetcher::new(api, 100),
            FileWriter::new(),
            fx.layout.clone(),
        )
    }

    fn job(fx: &Fixture, index: usize, ids: &[&str]) -> BatchJob {
        BatchJob {
            export_id: fx.export_id,
            folder_name: fx.folder_name.clone(),
            batch_index: index,
            playlists: ids.iter().map(|id| playlist(id)).collect(),
        }
    }

    #[tokio::test]
    async fn test_non_final_batch_is_counted() {
        let fx = fixture(3, 2).await;
        let outcome = worker(&fx, None).run(&job(&fx, 0, &["a", "b"])).await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Completed(BatchProgress {
                completed: 1,
                total: 2
            })
        );
        let export = fx.store.get(fx.export_id).await.unwrap().unwrap();
        assert_eq!(export.playlists_exported, 2);
        assert!(!export.finished);
        assert!(fx.layout.working_dir(&fx.folder_name).join("42-List-a.csv").exists());
    }

    #[tokio::test]
    async fn test_last_batch_finalizes() {
        let fx = fixture(3, 2).await;
        let worker = worker(&fx, None);
        worker.run(&job(&fx, 0, &["a", "b"])).await.unwrap();
        let outcome = worker.run(&job(&fx, 1, &["c"])).await.unwrap();

        match outcome {
            BatchOutcome::Finalized { progress, archive } => {
                assert!(progress.is_last());
                assert_eq!(archive.entries, 6);
                assert!(archive.path.exists());
            }
            other => panic!("expected finalization, got {other:?}"),
        }
        let export = fx.store.get(fx.export_id).await.unwrap().unwrap();
        assert!(export.finished);
        assert!(!fx.layout.working_dir(&fx.folder_name).exists());
    }

    #[tokio::test]
    async fn test_failure_does_not_count_batch() {
        let fx = fixture(2, 1).await;
        let result = worker(&fx, Some("b")).run(&job(&fx, 0, &["a", "b"])).await;

        assert!(matches!(result, Err(ExportError::RemoteFetch(_))));
        let export = fx.store.get(fx.export_id).await.unwrap().unwrap();
        assert_eq!(export.playlists_exported, 1);
        assert_eq!(export.completed_batches, 0);
        assert!(!export.finished);
    }

    #[tokio::test]
    async fn test_resume_skips_playlists_already_counted() {
        let fx = fixture(3, 1).await;
        let batch = job(&fx, 0, &["a", "b", "c"]);
        let mut counted = 0;

        let failed = worker(&fx, Some("b")).resume(&batch, &mut counted).await;
        assert!(failed.is_err());
        assert_eq!(counted, 1);

        let outcome = worker(&fx, Some("a"))
            .resume(&batch, &mut counted)
            .await
            .unwrap();

        assert!(matches!(outcome, BatchOutcome::Finalized { .. }));
        assert_eq!(counted, 3);
        let export = fx.store.get(fx.export_id).await.unwrap().unwrap();
        assert_eq!(export.playlists_exported, 3);
        assert!(export.finished);
    }

    #[tokio::test]
    async fn test_repeated_delivery_is_ignored() {
        let fx = fixture(1, 1).await;
        let worker = worker(&fx, None);
        worker.run(&job(&fx, 0, &["a"])).await.unwrap();
        let outcome = worker.run(&job(&fx, 0, &["a"])).await.unwrap();

        assert_eq!(outcome, BatchOutcome::AlreadyCounted);
        let export = fx.store.get(fx.export_id).await.unwrap().unwrap();
        assert_eq!(export.playlists_exported, 1);
    }

    #[tokio::test]
    async fn test_finalize_without_directory_leaves_export_unfinished() {
        let fx = fixture(0, 0).await;
        std::fs::remove_dir_all(fx.layout.working_dir(&fx.folder_name)).unwrap();
        let archiver = Archiver::new(fx.layout.clone());

        let result =
            finalize_export(fx.store.as_ref(), &archiver, fx.export_id, &fx.folder_name).await;

        assert!(matches!(result, Err(ExportError::Archival(_))));
        assert!(!fx.store.get(fx.export_id).await.unwrap().unwrap().finished);
    }

    #[tokio::test]
    async fn test_second_finalization_is_invariant_violation() {
        let fx = fixture(0, 0).await;
        let archiver = Archiver::new(fx.layout.clone());
        finalize_export(fx.store.as_ref(), &archiver, fx.export_id, &fx.folder_name)
            .await
            .unwrap();

        std::fs::create_dir_all(fx.layout.working_dir(&fx.folder_name)).unwrap();
        let result =
            finalize_export(fx.store.as_ref(), &archiver, fx.export_id, &fx.folder_name).await;

        assert!(matches!(result, Err(ExportError::InvariantViolation(_))));
    }
}
