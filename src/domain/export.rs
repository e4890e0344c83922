//! Export record model
//!
//! An [`Export`] is the durable job record for one run of the pipeline. Its two
//! counters are the only shared mutable state between concurrently running batch
//! workers, and they are only ever changed through the atomic operations of
//! [`ExportStore`](crate::adapters::database::ExportStore).

use crate::domain::ids::{ExportId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    /// Record identifier
    pub id: ExportId,

    /// User that requested the export
    pub owner_id: OwnerId,

    /// Set exactly once, after the archive has been published
    pub finished: bool,

    /// Number of playlists found during enumeration
    pub playlist_count: u64,

    /// Playlists whose files have been written
    pub playlists_exported: u64,

    /// Number of batches dispatched
    pub total_batches: u64,

    /// Batches that ran to completion
    pub completed_batches: u64,

    /// Key of the working directory and archive on disk. Never changes.
    pub folder_name: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Values needed to create an export record
#[derive(Debug, Clone)]
pub struct NewExport {
    /// Record identifier
    pub id: ExportId,
    /// Requesting user
    pub owner_id: OwnerId,
    /// Derived folder name
    pub folder_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl NewExport {
    /// Create a new record description with a fresh id
    pub fn new(owner_id: OwnerId, folder_name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ExportId::generate(),
            owner_id,
            folder_name,
            created_at,
        }
    }

    /// Materialize the initial record: unfinished, all counts zero
    pub fn into_export(self) -> Export {
        Export {
            id: self.id,
            owner_id: self.owner_id,
            finished: false,
            playlist_count: 0,
            playlists_exported: 0,
            total_batches: 0,
            completed_batches: 0,
            folder_name: self.folder_name,
            created_at: self.created_at,
        }
    }
}

/// Post-increment snapshot of the batch counters
///
/// Returned by the same atomic operation that performed the increment, so the
/// worker that sees `completed == total` is the only one that can see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Completed batches after the increment
    pub completed: u64,
    /// Total batches for the export
    pub total: u64,
}

impl BatchProgress {
    /// Whether this snapshot is the one that completed the export
    pub fn is_last(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl Export {
    /// Percentage of playlists written
    pub fn playlist_progress_pct(&self) -> f64 {
        percentage(self.playlists_exported, self.playlist_count, self.finished)
    }

    /// Percentage of batches completed
    pub fn batch_progress_pct(&self) -> f64 {
        percentage(self.completed_batches, self.total_batches, self.finished)
    }

    /// Check the counter invariants of the record
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.playlists_exported > self.playlist_count {
            return Err(format!(
                "playlists_exported ({}) exceeds playlist_count ({})",
                self.playlists_exported, self.playlist_count
            ));
        }
        if self.completed_batches > self.total_batches {
            return Err(format!(
                "completed_batches ({}) exceeds total_batches ({})",
                self.completed_batches, self.total_batches
            ));
        }
        if self.finished && self.completed_batches != self.total_batches {
            return Err(format!(
                "export finished with {}/{} batches completed",
                self.completed_batches, self.total_batches
            ));
        }
        Ok(())
    }
}

fn percentage(done: u64, total: u64, finished: bool) -> f64 {
    if total == 0 {
        return if finished { 100.0 } else { 0.0 };
    }
    (done as f64 / total as f64) * 100.0
}
