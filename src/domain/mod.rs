//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`OwnerId`], [`PlaylistId`], [`ExportId`])
//! - **The export job record** ([`Export`], [`BatchProgress`])
//! - **Catalog entities** ([`Playlist`], [`TrackItem`], [`TrackRow`])
//! - **Error types** ([`ExportError`], [`RemoteFetchError`], [`WriteError`], [`ArchivalError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExportError>`]:
//!
//! ```rust
//! use playlist_export::domain::{ExportError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = playlist_export::config::load_config("playlist-export.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod export;
pub mod ids;
pub mod playlist;
pub mod result;

pub use errors::{ArchivalError, ExportError, RemoteFetchError, WriteError};
pub use export::{BatchProgress, Export, NewExport};
pub use ids::{ExportId, OwnerId, PlaylistId};
pub use playlist::{CurrentUser, Playlist, PlaylistOwner, TrackItem, TrackRow};
pub use result::Result;
