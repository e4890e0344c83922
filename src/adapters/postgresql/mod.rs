//! PostgreSQL export store
//!
//! Requires the `playlist_exports` table from `migrations/001_playlist_exports.sql`,
//! which [`PostgresExportStore::ensure_schema`] applies.

pub mod client;
pub mod store;

pub use client::PostgreSQLClient;
pub use store::PostgresExportStore;
