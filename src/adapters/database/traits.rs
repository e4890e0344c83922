//! Export record storage trait
//!
//! The two counters of an [`Export`] are the only state shared between batch
//! workers, so every mutation goes through an operation that is atomic with
//! respect to concurrent callers and hands back the state it produced.

use crate::domain::ids::{ExportId, OwnerId};
use crate::domain::{BatchProgress, Export, NewExport, Result};
use async_trait::async_trait;

/// Durable store for export records
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Insert a new record (unfinished, all counts zero)
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`](crate::domain::ExportError::Validation)
    /// if the folder name is already in use.
    async fn create(&self, new_export: NewExport) -> Result<Export>;

    /// Load a record by id
    async fn get(&self, id: ExportId) -> Result<Option<Export>>;

    /// All records of one owner, newest first
    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Export>>;

    /// Record the number of playlists found during enumeration
    async fn set_playlist_count(&self, id: ExportId, playlist_count: u64) -> Result<()>;

    /// Record the number of batches dispatched
    async fn set_total_batches(&self, id: ExportId, total_batches: u64) -> Result<()>;

    /// Add one to `playlists_exported`, never exceeding `playlist_count`
    ///
    /// Returns the value after the increment.
    async fn increment_playlists_exported(&self, id: ExportId) -> Result<u64>;

    /// Add one to `completed_batches` and return the resulting counters
    ///
    /// The snapshot comes from the same atomic operation as the increment. Returns
    /// `None` when every batch has already been counted, which happens only when a
    /// batch job is delivered more than once.
    async fn increment_completed_batches(&self, id: ExportId) -> Result<Option<BatchProgress>>;

    /// Transition the record to finished
    ///
    /// Returns `true` only for the call that performed the transition. Requires
    /// `completed_batches == total_batches`.
    async fn mark_finished(&self, id: ExportId) -> Result<bool>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, id: ExportId) -> Result<bool>;
}
