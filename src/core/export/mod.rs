//! Export pipeline
//!
//! This module provides the export logic, including:
//! - Paging through catalog collections and partitioning playlists into batches
//! - Writing one JSON and one CSV file per playlist
//! - Batch dispatch, batch workers and the single finalization of an export
//! - Atomic archive publication
//! - Listing, deletion and download of finished exports

pub mod archive;
pub mod batcher;
pub mod coordinator;
pub mod dispatch;
pub mod layout;
pub mod lifecycle;
pub mod naming;
pub mod paginator;
pub mod tracks;
pub mod worker;
pub mod writer;

pub use archive::{Archiver, PublishedArchive};
pub use batcher::partition;
pub use coordinator::{CoordinatorSettings, ExportCoordinator};
pub use dispatch::{BatchJob, DispatchReport, DispatchSettings, JobDispatcher, LocalDispatcher};
pub use layout::{folder_name_for, ExportLayout};
pub use lifecycle::{ArchiveDownload, ExportLifecycle, ExportStatusView};
pub use naming::{playlist_file_stem, sanitize_file_stem};
pub use paginator::{fetch_all, Paginator};
pub use tracks::TrackFetcher;
pub use worker::{finalize_export, BatchOutcome, BatchWorker};
pub use writer::{FileWriter, WrittenFiles};
