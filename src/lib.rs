//! # playlist-export - Spotify playlist archiver
//!
//! Exports every playlist of a Spotify user into one zip archive holding a JSON and
//! a CSV file per playlist.
//!
//! ## Overview
//!
//! An export run:
//! - **Enumerates** the user's playlists page by page
//! - **Partitions** them into fixed-size batches, one job per batch
//! - **Writes** each playlist's track list as JSON and CSV in a working directory
//! - **Counts** completed batches atomically in a durable export record
//! - **Archives** the working directory once, from the worker that completes the last batch
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline: paginator, batcher, writer, workers, archiver
//! - [`adapters`] - External integrations (Spotify Web API, export record stores)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playlist_export::adapters::database::create_export_store;
//! use playlist_export::adapters::spotify::{CatalogApi, SpotifyClient};
//! use playlist_export::config::load_config;
//! use playlist_export::core::export::{
//!     BatchWorker, CoordinatorSettings, DispatchSettings, ExportCoordinator, ExportLayout,
//!     FileWriter, LocalDispatcher, TrackFetcher,
//! };
//! use playlist_export::domain::OwnerId;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("playlist-export.toml")?;
//!     let api: Arc<dyn CatalogApi> = Arc::new(SpotifyClient::new(&config.spotify)?);
//!     let owner = OwnerId::new(api.current_user().await?.id)?;
//!     let store = create_export_store(&config).await?;
//!     let layout = ExportLayout::new(&config.export.storage_root);
//!
//!     let worker = Arc::new(BatchWorker::new(
//!         store.clone(),
//!         TrackFetcher::new(api.clone(), config.export.track_page_limit),
//!         FileWriter::new(),
//!         layout.clone(),
//!     ));
//!     let dispatcher = Arc::new(LocalDispatcher::new(
//!         worker,
//!         DispatchSettings {
//!             max_concurrent: 4,
//!             max_attempts: 1,
//!             retry_delay: Duration::from_secs(1),
//!         },
//!     ));
//!     let coordinator = ExportCoordinator::new(
//!         store,
//!         api,
//!         dispatcher.clone(),
//!         layout,
//!         CoordinatorSettings::from_config(&config.export)?,
//!     );
//!
//!     let export = coordinator.start(&owner).await?;
//!     let report = dispatcher.drain().await;
//!     println!("{}: {} batches, {} failed", export.id, export.total_batches, report.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! The library uses [`domain::ExportError`] for all errors; the pipeline stages
//! have their own taxonomies ([`domain::RemoteFetchError`], [`domain::WriteError`],
//! [`domain::ArchivalError`]) that convert into it with `?`.
//!
//! ## Logging
//!
//! Structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(export_id = "6f1c2a52", "Export started");
//! warn!(playlist_id = "37i9dQZF1DXcBWIGoYBM5M", "Empty page before total reached");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
