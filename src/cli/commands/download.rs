//! Download command implementation
//!
//! Copies a finished archive out of the storage root under its download name.

use super::{exit_code_for, open_session};
use crate::core::export::{ArchiveDownload, ExportLifecycle};
use crate::domain::ids::ExportId;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Export to download
    #[arg(long)]
    pub id: ExportId,

    /// Destination directory or file
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,
}

impl DownloadArgs {
    /// Execute the download command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(export_id = %self.id, dest = %self.dest.display(), "Downloading export");

        let session = match open_session(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let lifecycle = ExportLifecycle::new(session.store, session.layout);

        let download = match lifecycle.locate_archive(&session.owner, self.id).await {
            Ok(d) => d,
            Err(e) => {
                println!("❌ Archive for export {} is not available", self.id);
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let target = destination(&self.dest, &download);
        if let Err(e) = tokio::fs::copy(&download.path, &target).await {
            tracing::error!(error = %e, target = %target.display(), "Failed to copy archive");
            println!("❌ Failed to write {}", target.display());
            println!("   Error: {e}");
            return Ok(5);
        }

        println!("📦 Saved {}", target.display());
        Ok(0)
    }
}

/// Directories receive the archive under its download name
fn destination(dest: &Path, download: &ArchiveDownload) -> PathBuf {
    if dest.is_dir() {
        dest.join(&download.download_name)
    } else {
        dest.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn download() -> ArchiveDownload {
        ArchiveDownload {
            path: PathBuf::from("/data/exports/42-1.zip"),
            download_name: "spotify-playlists-20240309_140507.zip".to_string(),
        }
    }

    #[test]
    fn test_directory_destination_uses_download_name() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            destination(dir.path(), &download()),
            dir.path().join("spotify-playlists-20240309_140507.zip")
        );
    }

    #[test]
    fn test_file_destination_is_kept() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mine.zip");
        assert_eq!(destination(&file, &download()), file);
    }
}
