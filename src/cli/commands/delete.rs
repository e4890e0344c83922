//! Delete command implementation

use super::{exit_code_for, open_session};
use crate::core::export::ExportLifecycle;
use crate::domain::ids::ExportId;
use clap::Args;

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Export to delete
    #[arg(long)]
    pub id: ExportId,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(export_id = %self.id, "Deleting export");

        let session = match open_session(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let lifecycle = ExportLifecycle::new(session.store, session.layout);

        match lifecycle.delete_export(&session.owner, self.id).await {
            Ok(()) => {
                println!("🗑️  Export {} deleted", self.id);
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to delete export {}", self.id);
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
