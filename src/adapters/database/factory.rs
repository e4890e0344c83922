//! Export store factory
//!
//! Selects the store backend from `database_target`.

use crate::adapters::database::memory::InMemoryExportStore;
use crate::adapters::database::traits::ExportStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgresExportStore};
use crate::config::schema::{DatabaseTarget, ExporterConfig};
use crate::domain::{ExportError, Result};
use std::sync::Arc;

/// Create the export store selected by the configuration
///
/// The PostgreSQL backend is connection-tested and its schema applied before it
/// is returned.
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or the database is
/// unreachable.
pub async fn create_export_store(config: &ExporterConfig) -> Result<Arc<dyn ExportStore>> {
    match config.database_target {
        DatabaseTarget::Memory => {
            tracing::info!("Using in-memory export store");
            Ok(Arc::new(InMemoryExportStore::new()))
        }
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ExportError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            let client = PostgreSQLClient::new(pg_config.clone())?;
            tracing::info!(
                target_db = %client.connection_string_safe(),
                "Creating PostgreSQL export store"
            );
            client.test_connection().await?;

            let store = PostgresExportStore::new(client);
            store.ensure_schema().await?;

            Ok(Arc::new(store))
        }
    }
}
