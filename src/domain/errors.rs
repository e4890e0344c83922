//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. The three pipeline
//! failure families (remote reads, file writes, archival) have their own enums so
//! callers can tell a retryable fetch failure from a recoverable archival failure.
//! None of them expose third-party types.

use std::path::PathBuf;
use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A paginated read from the catalog API failed
    #[error("Remote fetch error: {0}")]
    RemoteFetch(#[from] RemoteFetchError),

    /// Writing playlist output to disk failed
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// The export directory could not be archived
    #[error("Archival error: {0}")]
    Archival(#[from] ArchivalError),

    /// Export record storage errors
    #[error("Store error: {0}")]
    Store(String),

    /// The requested export does not exist
    #[error("Export not found: {0}")]
    NotFound(String),

    /// The caller does not own the export
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A structural guarantee was broken. Always a defect.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Catalog API errors
///
/// Raised by the API client and the paginator. The client has already applied its
/// own retry policy by the time one of these reaches the pipeline.
#[derive(Debug, Error)]
pub enum RemoteFetchError {
    /// Failed to reach the API
    #[error("Failed to connect to catalog API: {0}")]
    ConnectionFailed(String),

    /// Access token rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token refresh against the accounts service failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Rate limit still exceeded after retries
    #[error("Rate limit exceeded, retry after: {0}s")]
    RateLimited(u64),

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

/// File output errors
#[derive(Debug, Error)]
pub enum WriteError {
    /// Directory could not be created
    #[error("Failed to create directory {path}: {message}")]
    CreateDirectory { path: PathBuf, message: String },

    /// File could not be written
    #[error("Failed to write {path}: {message}")]
    WriteFile { path: PathBuf, message: String },

    /// Output could not be encoded
    #[error("Failed to encode output: {0}")]
    Encode(String),
}

/// Archival errors
///
/// Any of these leaves the working directory on disk untouched.
#[derive(Debug, Error)]
pub enum ArchivalError {
    /// The working directory is missing
    #[error("Working directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// Walking the working directory failed
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// The archive file could not be created
    #[error("Failed to create archive {path}: {message}")]
    Create { path: PathBuf, message: String },

    /// A file could not be added
    #[error("Failed to add {entry} to archive: {message}")]
    AddEntry { entry: String, message: String },

    /// Finishing or flushing the archive failed
    #[error("Failed to finalize archive {path}: {message}")]
    Finish { path: PathBuf, message: String },

    /// Renaming the partial archive into place failed
    #[error("Failed to publish archive {path}: {message}")]
    Publish { path: PathBuf, message: String },

    /// The archiving task panicked or was cancelled
    #[error("Archive task failed: {0}")]
    Task(String),
}

impl RemoteFetchError {
    /// Whether the client should retry the request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteFetchError::ConnectionFailed(_)
                | RemoteFetchError::RateLimited(_)
                | RemoteFetchError::ServerError { .. }
        )
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for WriteError {
    fn from(err: csv::Error) -> Self {
        WriteError::Encode(err.to_string())
    }
}

impl From<tokio_postgres::Error> for ExportError {
    fn from(err: tokio_postgres::Error) -> Self {
        ExportError::Store(err.to_string())
    }
}
