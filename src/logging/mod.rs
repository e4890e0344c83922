//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - Human-readable console output
//! - Optional JSON log files with daily or hourly rotation
//! - `RUST_LOG` overrides the configured level
//!
//! # Example
//!
//! ```no_run
//! use playlist_export::logging::init_logging;
//! use playlist_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(owner_id = "alice", "Export started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the completion of one batch of an export
///
/// # Example
///
/// ```no_run
/// use playlist_export::log_batch_complete;
///
/// let export_id = "0b9c...";
/// log_batch_complete!(export_id, 2, 3);
/// ```
#[macro_export]
macro_rules! log_batch_complete {
    ($export_id:expr, $completed:expr, $total:expr) => {
        tracing::info!(
            export_id = %$export_id,
            completed_batches = $completed,
            total_batches = $total,
            progress_pct = ($completed as f64 / $total as f64 * 100.0),
            "Batch completed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use playlist_export::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
