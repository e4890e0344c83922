//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the exporter using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// playlist-export - Spotify playlist archiver
#[derive(Parser, Debug)]
#[command(name = "playlist-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "playlist-export.toml",
        env = "PLAYLIST_EXPORT_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PLAYLIST_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every playlist of the authenticated user into a zip archive
    Export(commands::export::ExportArgs),

    /// List exports with their progress
    Status(commands::status::StatusArgs),

    /// Delete an export and its files
    Delete(commands::delete::DeleteArgs),

    /// Copy a finished archive to a local path
    Download(commands::download::DownloadArgs),

    /// Retry archiving an export whose batches all completed
    Finalize(commands::finalize::FinalizeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "6f1c2a52-0d47-4a43-9d53-2a4f3b7f8e10";

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["playlist-export", "export"]);
        assert_eq!(cli.config, "playlist-export.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["playlist-export", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["playlist-export", "--log-level", "debug", "export"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_delete() {
        let cli = Cli::parse_from(["playlist-export", "delete", "--id", ID]);
        match cli.command {
            Commands::Delete(args) => assert_eq!(args.id.to_string(), ID),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_download() {
        let cli = Cli::parse_from(["playlist-export", "download", "--id", ID, "--dest", "out"]);
        match cli.command {
            Commands::Download(args) => assert_eq!(args.dest.to_str(), Some("out")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_malformed_id() {
        let result = Cli::try_parse_from(["playlist-export", "finalize", "--id", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["playlist-export", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }
}
