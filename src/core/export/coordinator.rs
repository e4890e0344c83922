//! Export coordinator - starts an export run
//!
//! Creates the export record and working directory, enumerates the owner's
//! playlists, fixes the playlist and batch totals, and hands one job per batch
//! to the dispatcher. The coordinator never waits for the batches; the worker
//! that completes the last one finalizes the export.

use super::archive::Archiver;
use super::batcher::partition;
use super::dispatch::{BatchJob, JobDispatcher};
use super::layout::{folder_name_for, ExportLayout};
use super::paginator::fetch_all;
use super::worker::finalize_export;
use crate::adapters::database::ExportStore;
use crate::adapters::spotify::{CatalogApi, Resource};
use crate::config::ExportConfig;
use crate::domain::ids::OwnerId;
use crate::domain::{Export, ExportError, NewExport, Playlist, Result, WriteError};
use chrono::Utc;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Maximum page size of the current user's playlists endpoint
pub const MAX_PLAYLIST_PAGE_LIMIT: usize = 50;

/// Pipeline sizing used by the coordinator
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    /// Playlists per batch
    pub batch_size: NonZeroUsize,
    /// Page size when enumerating playlists
    pub playlist_page_limit: usize,
}

impl CoordinatorSettings {
    /// Build settings from the `[export]` section
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] if `batch_size` is zero.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let batch_size = NonZeroUsize::new(config.batch_size).ok_or_else(|| {
            ExportError::Configuration("export.batch_size must be greater than 0".to_string())
        })?;

        Ok(Self {
            batch_size,
            playlist_page_limit: config.playlist_page_limit.clamp(1, MAX_PLAYLIST_PAGE_LIMIT),
        })
    }
}

/// Export coordinator
pub struct ExportCoordinator {
    store: Arc<dyn ExportStore>,
    api: Arc<dyn CatalogApi>,
    dispatcher: Arc<dyn JobDispatcher>,
    layout: ExportLayout,
    archiver: Archiver,
    settings: CoordinatorSettings,
}

impl ExportCoordinator {
    /// Create a coordinator
    pub fn new(
        store: Arc<dyn ExportStore>,
        api: Arc<dyn CatalogApi>,
        dispatcher: Arc<dyn JobDispatcher>,
        layout: ExportLayout,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            store,
            api,
            dispatcher,
            archiver: Archiver::new(layout.clone()),
            layout,
            settings,
        }
    }

    /// Start an export for `owner_id`
    ///
    /// Returns the record as it stands once every batch has been dispatched. With
    /// no playlists the export is archived and finished before this returns.
    ///
    /// # Errors
    ///
    /// Fails if the record cannot be created, the working directory cannot be
    /// created, enumeration fails, or a job cannot be dispatched. A record created
    /// before the failure stays unfinished.
    pub async fn start(&self, owner_id: &OwnerId) -> Result<Export> {
        let created_at = Utc::now();
        let folder_name = folder_name_for(owner_id.as_str(), created_at);
        let export = self
            .store
            .create(NewExport::new(owner_id.clone(), folder_name, created_at))
            .await?;

        tracing::info!(
            export_id = %export.id,
            owner_id = %owner_id,
            folder_name = %export.folder_name,
            "Export started"
        );

        if let Err(e) = self.enumerate_and_dispatch(&export).await {
            tracing::error!(
                export_id = %export.id,
                error = %e,
                "Error setting up export batches"
            );
            return Err(e);
        }

        self.store
            .get(export.id)
            .await?
            .ok_or_else(|| ExportError::NotFound(export.id.to_string()))
    }

    async fn enumerate_and_dispatch(&self, export: &Export) -> Result<()> {
        let working_dir = self.layout.working_dir(&export.folder_name);
        tokio::fs::create_dir_all(&working_dir)
            .await
            .map_err(|e| WriteError::CreateDirectory {
                path: working_dir.clone(),
                message: e.to_string(),
            })?;

        let playlists: Vec<Playlist> = fetch_all(
            self.api.as_ref(),
            Resource::MyPlaylists,
            self.settings.playlist_page_limit,
        )
        .await?;
        self.store
            .set_playlist_count(export.id, playlists.len() as u64)
            .await?;

        let batches = partition(playlists, self.settings.batch_size);
        self.store
            .set_total_batches(export.id, batches.len() as u64)
            .await?;

        tracing::info!(
            export_id = %export.id,
            total_batches = batches.len(),
            batch_size = self.settings.batch_size.get(),
            "Playlists enumerated"
        );

        if batches.is_empty() {
            tracing::info!(export_id = %export.id, "No playlists, finishing export");
            finalize_export(
                self.store.as_ref(),
                &self.archiver,
                export.id,
                &export.folder_name,
            )
            .await?;
            return Ok(());
        }

        for (batch_index, playlists) in batches.into_iter().enumerate() {
            self.dispatcher
                .dispatch(BatchJob {
                    export_id: export.id,
                    folder_name: export.folder_name.clone(),
                    batch_index,
                    playlists,
                })
                .await?;
        }

        Ok(())
    }
}
