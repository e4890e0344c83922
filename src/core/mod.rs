//! Core business logic for the exporter.
//!
//! # Export Workflow
//!
//! 1. **Enumerate**: Page through the owner's playlists
//! 2. **Batch**: Partition playlists into fixed-size batches and dispatch one job each
//! 3. **Write**: Each worker fetches tracks and writes JSON and CSV files per playlist
//! 4. **Count**: Each worker atomically increments the completed batch counter
//! 5. **Finalize**: The worker that completes the last batch zips and publishes the archive
//!
//! # Example
//!
//! ```rust,no_run
//! use playlist_export::core::export::ExportLayout;
//!
//! let layout = ExportLayout::new("/var/lib/playlist-export");
//! println!("Archives land in {}", layout.root().display());
//! ```

pub mod export;
