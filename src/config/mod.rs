//! Configuration management.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PLAYLIST_EXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SpotifyConfig`] - Catalog API endpoints, OAuth credentials and retry policy
//! - [`ExportConfig`] - Storage root, batch size, page limits, concurrency
//! - [`PostgreSQLConfig`] - Export record store (when `database_target = "postgresql"`)
//! - [`LoggingConfig`] - Rolling JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [spotify]
//! client_id = "${SPOTIFY_CLIENT_ID}"
//! client_secret = "${SPOTIFY_CLIENT_SECRET}"
//! refresh_token = "${SPOTIFY_REFRESH_TOKEN}"
//!
//! [export]
//! storage_root = "/var/lib/playlist-export"
//! batch_size = 12
//! max_concurrent_batches = 4
//!
//! [postgresql]
//! connection_string = "${DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DatabaseTarget, ExportConfig, ExporterConfig, LoggingConfig,
    PostgreSQLConfig, RetryConfig, SpotifyConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
