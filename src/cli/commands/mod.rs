//! CLI command implementations
//!
//! This module contains all CLI command implementations and the session setup
//! they share.

pub mod delete;
pub mod download;
pub mod export;
pub mod finalize;
pub mod status;
pub mod validate;

use crate::adapters::database::{create_export_store, ExportStore};
use crate::adapters::spotify::{CatalogApi, SpotifyClient};
use crate::config::{load_config, ExporterConfig};
use crate::core::export::ExportLayout;
use crate::domain::ids::OwnerId;
use crate::domain::ExportError;
use std::sync::Arc;

/// Everything an owner-scoped command needs
pub(crate) struct Session {
    pub config: ExporterConfig,
    pub api: Arc<dyn CatalogApi>,
    pub store: Arc<dyn ExportStore>,
    pub layout: ExportLayout,
    pub owner: OwnerId,
}

/// Load configuration, authenticate and connect to the record store
///
/// On failure the error has been reported and the exit code is returned.
pub(crate) async fn open_session(config_path: &str) -> Result<Session, i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            return Err(2); // Configuration error exit code
        }
    };
    open_session_with(config).await
}

/// Same as [`open_session`] for an already loaded configuration
pub(crate) async fn open_session_with(config: ExporterConfig) -> Result<Session, i32> {
    let client = match SpotifyClient::new(&config.spotify) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to create Spotify client");
            println!("   Error: {e}");
            return Err(2);
        }
    };

    let user = match client.current_user().await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "Failed to identify the current user");
            println!("❌ Failed to authenticate with Spotify");
            println!("   Error: {e}");
            return Err(4); // Connection error exit code
        }
    };
    let owner = match OwnerId::new(user.id) {
        Ok(o) => o,
        Err(e) => {
            println!("❌ Spotify returned an unusable user id: {e}");
            return Err(4);
        }
    };

    let store = match create_export_store(&config).await {
        Ok(s) => s,
        Err(e) => {
            println!("❌ Failed to connect to database");
            println!("   Error: {e}");
            return Err(4);
        }
    };

    tracing::info!(owner_id = %owner, "Authenticated");

    Ok(Session {
        layout: ExportLayout::new(&config.export.storage_root),
        api: Arc::new(client),
        store,
        owner,
        config,
    })
}

/// Exit code for a failed lifecycle operation
pub(crate) fn exit_code_for(error: &ExportError) -> i32 {
    match error {
        ExportError::NotFound(_)
        | ExportError::PermissionDenied(_)
        | ExportError::Validation(_) => 1,
        ExportError::Configuration(_) => 2,
        ExportError::RemoteFetch(_) | ExportError::Store(_) => 4,
        _ => 5,
    }
}
