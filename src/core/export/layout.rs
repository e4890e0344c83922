//! On-disk layout of exports
//!
//! ```text
//! {storage_root}/exports/{folder_name}/             working directory
//! {storage_root}/exports/{folder_name}.zip.partial  archive being written
//! {storage_root}/exports/{folder_name}.zip          published archive
//! ```

use super::naming::sanitize_file_stem;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Directory under the storage root that holds all exports
pub const EXPORTS_DIR: &str = "exports";

/// Resolves paths for an export's working directory and archive
#[derive(Debug, Clone)]
pub struct ExportLayout {
    root: PathBuf,
}

impl ExportLayout {
    /// Layout rooted at `{storage_root}/exports`
    pub fn new(storage_root: impl AsRef<Path>) -> Self {
        Self {
            root: storage_root.as_ref().join(EXPORTS_DIR),
        }
    }

    /// The `exports` directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Working directory holding the raw JSON and CSV files
    pub fn working_dir(&self, folder_name: &str) -> PathBuf {
        self.root.join(folder_name)
    }

    /// Final archive location
    pub fn archive_path(&self, folder_name: &str) -> PathBuf {
        self.root.join(format!("{folder_name}.zip"))
    }

    /// Location the archive is written to before it is renamed into place
    pub fn partial_archive_path(&self, folder_name: &str) -> PathBuf {
        self.root.join(format!("{folder_name}.zip.partial"))
    }
}

/// Folder name for an export created by `owner_id` at `created_at`
///
/// Millisecond precision keeps two exports started by the same owner within one
/// second apart; the store rejects any remaining duplicate.
pub fn folder_name_for(owner_id: &str, created_at: DateTime<Utc>) -> String {
    let owner = sanitize_file_stem(owner_id);
    let owner = if owner.is_empty() { "user" } else { owner.as_str() };
    format!("{owner}-{}", created_at.format("%Y%m%d%H%M%S%3f"))
}
