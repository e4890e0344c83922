//! PostgreSQL-backed export store
//!
//! Every counter change is a single `UPDATE ... RETURNING` statement, so the row
//! lock taken by the update also covers the read of the new values.

use super::client::PostgreSQLClient;
use crate::adapters::database::ExportStore;
use crate::domain::ids::{ExportId, OwnerId};
use crate::domain::{BatchProgress, Export, ExportError, NewExport, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, owner_id, finished, playlist_count, playlists_exported, \
     total_batches, completed_batches, folder_name, created_at";

/// Export store backed by the `playlist_exports` table
pub struct PostgresExportStore {
    client: PostgreSQLClient,
}

impl PostgresExportStore {
    /// Wrap a client
    pub fn new(client: PostgreSQLClient) -> Self {
        Self { client }
    }

    /// Create the table if needed
    pub async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    fn expect_row_updated(id: ExportId, updated: u64) -> Result<()> {
        if updated == 0 {
            return Err(ExportError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn exists(&self, id: ExportId) -> Result<bool> {
        let row = self
            .client
            .query_opt(
                "SELECT 1 FROM playlist_exports WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        Ok(row.is_some())
    }
}

fn to_db(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| ExportError::Validation(format!("counter value {value} out of range")))
}

fn from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn row_to_export(row: &Row) -> Result<Export> {
    let id: Uuid = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Export {
        id: ExportId::from_uuid(id),
        owner_id: OwnerId::new(owner_id).map_err(ExportError::Store)?,
        finished: row.try_get("finished")?,
        playlist_count: from_db(row.try_get("playlist_count")?),
        playlists_exported: from_db(row.try_get("playlists_exported")?),
        total_batches: from_db(row.try_get("total_batches")?),
        completed_batches: from_db(row.try_get("completed_batches")?),
        folder_name: row.try_get("folder_name")?,
        created_at,
    })
}

#[async_trait]
impl ExportStore for PostgresExportStore {
    async fn create(&self, new_export: NewExport) -> Result<Export> {
        let export = new_export.into_export();
        let query = format!(
            "INSERT INTO playlist_exports (id, owner_id, folder_name, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (folder_name) DO NOTHING \
             RETURNING {SELECT_COLUMNS}"
        );

        let row = self
            .client
            .query_opt(
                &query,
                &[
                    export.id.as_uuid(),
                    &export.owner_id.as_str(),
                    &export.folder_name,
                    &export.created_at,
                ],
            )
            .await?;

        match row {
            Some(row) => row_to_export(&row),
            None => Err(ExportError::Validation(format!(
                "folder name already in use: {}",
                export.folder_name
            ))),
        }
    }

    async fn get(&self, id: ExportId) -> Result<Option<Export>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM playlist_exports WHERE id = $1");
        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .as_ref()
            .map(row_to_export)
            .transpose()
    }

    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Export>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM playlist_exports \
             WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let rows = self.client.query(&query, &[&owner_id.as_str()]).await?;
        rows.iter().map(row_to_export).collect()
    }

    async fn set_playlist_count(&self, id: ExportId, playlist_count: u64) -> Result<()> {
        let updated = self
            .client
            .execute(
                "UPDATE playlist_exports SET playlist_count = $2 WHERE id = $1",
                &[id.as_uuid(), &to_db(playlist_count)?],
            )
            .await?;
        Self::expect_row_updated(id, updated)
    }

    async fn set_total_batches(&self, id: ExportId, total_batches: u64) -> Result<()> {
        let updated = self
            .client
            .execute(
                "UPDATE playlist_exports SET total_batches = $2 WHERE id = $1",
                &[id.as_uuid(), &to_db(total_batches)?],
            )
            .await?;
        Self::expect_row_updated(id, updated)
    }

    async fn increment_playlists_exported(&self, id: ExportId) -> Result<u64> {
        let row = self
            .client
            .query_opt(
                "UPDATE playlist_exports \
                 SET playlists_exported = LEAST(playlists_exported + 1, playlist_count) \
                 WHERE id = $1 \
                 RETURNING playlists_exported",
                &[id.as_uuid()],
            )
            .await?
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;

        Ok(from_db(row.try_get("playlists_exported")?))
    }

    async fn increment_completed_batches(&self, id: ExportId) -> Result<Option<BatchProgress>> {
        let row = self
            .client
            .query_opt(
                "UPDATE playlist_exports \
                 SET completed_batches = completed_batches + 1 \
                 WHERE id = $1 AND completed_batches < total_batches \
                 RETURNING completed_batches, total_batches",
                &[id.as_uuid()],
            )
            .await?;

        match row {
            Some(row) => Ok(Some(BatchProgress {
                completed: from_db(row.try_get("completed_batches")?),
                total: from_db(row.try_get("total_batches")?),
            })),
            None if self.exists(id).await? => Ok(None),
            None => Err(ExportError::NotFound(id.to_string())),
        }
    }

    async fn mark_finished(&self, id: ExportId) -> Result<bool> {
        let updated = self
            .client
            .execute(
                "UPDATE playlist_exports SET finished = TRUE \
                 WHERE id = $1 AND finished = FALSE AND completed_batches = total_batches",
                &[id.as_uuid()],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn delete(&self, id: ExportId) -> Result<bool> {
        let deleted = self
            .client
            .execute("DELETE FROM playlist_exports WHERE id = $1", &[id.as_uuid()])
            .await?;
        Ok(deleted == 1)
    }
}
