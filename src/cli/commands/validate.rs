//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the exporter configuration file.

use crate::adapters::postgresql::client::redact_connection_string;
use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading substitutes variables, applies overrides and validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Spotify API: {}", config.spotify.api_base_url);
        println!(
            "  Token Refresh: {}",
            if config.spotify.refresh_token.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );

        match config.database_target {
            DatabaseTarget::Memory => {
                println!("  Database Target: in-memory (records are lost on exit)");
            }
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_connection_string(
                            pg_config.connection_string.expose_secret().as_ref()
                        )
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!("  Storage Root: {}", config.export.storage_root);
        println!("  Batch Size: {}", config.export.batch_size);
        println!(
            "  Page Limits: {} playlists, {} tracks",
            config.export.playlist_page_limit, config.export.track_page_limit
        );
        println!(
            "  Concurrent Batches: {}",
            config.export.max_concurrent_batches
        );
        println!();
        Ok(0)
    }
}
