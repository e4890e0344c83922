//! Export command implementation
//!
//! This module implements the `export` command: start an export for the
//! authenticated Spotify user and wait for every batch to finish.

use super::{open_session_with, Session};
use crate::adapters::database::ExportStore;
use crate::config::load_config;
use crate::core::export::{
    BatchWorker, CoordinatorSettings, DispatchSettings, ExportCoordinator, FileWriter,
    LocalDispatcher, TrackFetcher,
};
use crate::domain::ExportError;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Override the number of playlists per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the number of batches processed concurrently
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.export.batch_size = batch_size;
        }
        if let Some(max_concurrent) = self.max_concurrent {
            tracing::info!(max_concurrent, "Overriding batch concurrency from CLI");
            config.export.max_concurrent_batches = max_concurrent;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let coordinator_settings = match CoordinatorSettings::from_config(&config.export) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Configuration validation failed: {e}");
                return Ok(2);
            }
        };
        let dispatch_settings = DispatchSettings {
            max_concurrent: config.export.max_concurrent_batches,
            max_attempts: config.export.job_max_attempts,
            retry_delay: Duration::from_millis(config.export.job_retry_delay_ms),
        };

        let session = match open_session_with(config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let Session {
            config,
            api,
            store,
            layout,
            owner,
        } = session;

        let worker = Arc::new(BatchWorker::new(
            store.clone(),
            TrackFetcher::new(api.clone(), config.export.track_page_limit),
            FileWriter::new(),
            layout.clone(),
        ));
        let dispatcher = Arc::new(LocalDispatcher::new(worker, dispatch_settings));
        let coordinator = ExportCoordinator::new(
            store.clone(),
            api,
            dispatcher.clone(),
            layout.clone(),
            coordinator_settings,
        );

        println!("🚀 Starting export for {owner}...");
        println!();

        let export = match coordinator.start(&owner).await {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "Export failed to start");
                eprintln!("Export failed: {e}");
                return Ok(match e {
                    ExportError::RemoteFetch(_) | ExportError::Store(_) => 4, // Connection error
                    _ => 5, // Fatal error
                });
            }
        };

        println!("  Export ID: {}", export.id);
        println!("  Playlists: {}", export.playlist_count);
        println!("  Batches: {}", export.total_batches);
        println!();

        let report = tokio::select! {
            report = dispatcher.drain() => report,
            _ = wait_for_shutdown(shutdown_signal) => {
                println!();
                println!("⚠️  Export interrupted. Batches still running were cancelled;");
                println!("   completed batches stay counted in the export record.");
                tracing::info!(export_id = %export.id, "Export interrupted by user signal");
                return Ok(130); // SIGINT exit code (standard Unix convention)
            }
        };

        let export = store.get(export.id).await?.unwrap_or(export);

        println!("📊 Export Summary:");
        println!(
            "  Playlists exported: {}/{}",
            export.playlists_exported, export.playlist_count
        );
        println!(
            "  Batches completed: {}/{}",
            export.completed_batches, export.total_batches
        );
        println!("  Failed batches: {}", report.failed);
        println!();

        if export.finished {
            println!(
                "✅ Archive ready: {}",
                layout.archive_path(&export.folder_name).display()
            );
            Ok(0)
        } else if !report.is_success() {
            println!("⚠️  Export completed with failures; the archive was not created");
            Ok(1) // Partial success
        } else {
            println!("⚠️  All batches completed but the archive could not be published.");
            println!("   Run 'playlist-export finalize --id {}' to retry.", export.id);
            Ok(1)
        }
    }
}

/// Resolve once the shutdown flag is raised; never resolves if the sender is gone
async fn wait_for_shutdown(mut shutdown_signal: watch::Receiver<bool>) {
    while !*shutdown_signal.borrow() {
        if shutdown_signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
