//! Status command implementation
//!
//! This module implements the `status` command for listing the current user's
//! exports and their progress.

use super::{exit_code_for, open_session};
use crate::core::export::{ExportLifecycle, ExportStatusView};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print the exports as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        let session = match open_session(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let lifecycle = ExportLifecycle::new(session.store, session.layout);

        let exports = match lifecycle.list_exports(&session.owner).await {
            Ok(e) => e,
            Err(e) => {
                println!("❌ Failed to load exports");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&exports)?);
            return Ok(0);
        }

        println!("📊 Export Status");
        println!();

        if exports.is_empty() {
            println!("No exports found.");
            println!("Run 'playlist-export export' to export your playlists.");
            return Ok(0);
        }

        println!("Found {} export(s):", exports.len());
        println!();
        println!(
            "{:<38} {:<20} {:<15} {:<12} {:<12}",
            "Export ID", "Created", "Status", "Playlists", "Batches"
        );
        println!("{}", "-".repeat(100));

        for view in &exports {
            println!(
                "{:<38} {:<20} {:<15} {:<12} {:<12}",
                view.id.to_string(),
                view.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                status_label(view),
                format!("{:.0}%", view.playlist_progress_pct),
                format!("{}/{}", view.completed_batches, view.total_batches),
            );
        }

        Ok(0)
    }
}

fn status_label(view: &ExportStatusView) -> &'static str {
    if view.finished && view.archive_available {
        "✅ Ready"
    } else if view.finished {
        "⚠️  Missing"
    } else if view.total_batches > 0 && view.completed_batches == view.total_batches {
        "❌ Unarchived"
    } else {
        "🔄 In Progress"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ExportId;
    use chrono::Utc;

    fn view(finished: bool, available: bool, completed: u64, total: u64) -> ExportStatusView {
        ExportStatusView {
            id: ExportId::generate(),
            folder_name: "42-1".to_string(),
            created_at: Utc::now(),
            finished,
            playlist_count: 3,
            playlists_exported: 3,
            total_batches: total,
            completed_batches: completed,
            playlist_progress_pct: 100.0,
            batch_progress_pct: 100.0,
            archive_available: available,
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&view(true, true, 1, 1)), "✅ Ready");
        assert_eq!(status_label(&view(true, false, 1, 1)), "⚠️  Missing");
        assert_eq!(status_label(&view(false, false, 1, 1)), "❌ Unarchived");
        assert_eq!(status_label(&view(false, false, 0, 1)), "🔄 In Progress");
    }
}
