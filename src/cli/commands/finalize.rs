//! Finalize command implementation
//!
//! Retries archiving an export whose batches all completed but whose archive
//! could not be published.

use super::{exit_code_for, open_session};
use crate::core::export::ExportLifecycle;
use crate::domain::ids::ExportId;
use clap::Args;

/// Arguments for the finalize command
#[derive(Args, Debug)]
pub struct FinalizeArgs {
    /// Export to finalize
    #[arg(long)]
    pub id: ExportId,
}

impl FinalizeArgs {
    /// Execute the finalize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(export_id = %self.id, "Retrying export finalization");

        let session = match open_session(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let lifecycle = ExportLifecycle::new(session.store, session.layout);

        match lifecycle.retry_finalization(&session.owner, self.id).await {
            Ok(archive) => {
                println!(
                    "✅ Archive ready: {} ({} files)",
                    archive.path.display(),
                    archive.entries
                );
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to finalize export {}", self.id);
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
