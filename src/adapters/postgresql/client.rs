//! PostgreSQL client implementation
//!
//! Connection pooling and schema setup for the export record store.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{ExportError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the pool
    /// cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                ExportError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| ExportError::Store(format!("Failed to create connection pool: {e}")))?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| ExportError::Store(format!("Connection test failed: {e}")))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Create the export table and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;
        let migration_sql = include_str!("../../../migrations/001_playlist_exports.sql");

        client
            .batch_execute(migration_sql)
            .await
            .map_err(|e| ExportError::Store(format!("Failed to execute migration: {e}")))?;

        tracing::info!("PostgreSQL schema initialized");
        Ok(())
    }

    async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| ExportError::Store(format!("Failed to get connection from pool: {e}")))
    }

    async fn with_timeout(&self) -> Result<deadpool_postgres::Object> {
        let client = self.get_connection().await?;
        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .execute(timeout_query.as_str(), &[])
            .await
            .map_err(|e| ExportError::Store(format!("Failed to set statement timeout: {e}")))?;
        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.with_timeout().await?;
        client
            .query(query, params)
            .await
            .map_err(|e| ExportError::Store(format!("Query failed: {e}")))
    }

    /// Execute a query expected to return at most one row
    pub async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let client = self.with_timeout().await?;
        client
            .query_opt(query, params)
            .await
            .map_err(|e| ExportError::Store(format!("Query failed: {e}")))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.with_timeout().await?;
        client
            .execute(statement, params)
            .await
            .map_err(|e| ExportError::Store(format!("Statement execution failed: {e}")))
    }

    /// Connection target with credentials removed, for logging
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }
}

pub(crate) fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
