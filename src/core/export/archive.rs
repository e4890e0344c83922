//! Archive creation and publication
//!
//! The working directory is zipped into `{folder}.zip.partial`, flushed to disk,
//! renamed to `{folder}.zip` and only then removed. An interruption before the
//! rename leaves the working directory untouched and no file under the final
//! archive name.

use super::layout::ExportLayout;
use crate::domain::ArchivalError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Summary of a published archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArchive {
    /// Final archive path
    pub path: PathBuf,
    /// Number of files stored
    pub entries: usize,
}

/// Zips export working directories
#[derive(Debug, Clone)]
pub struct Archiver {
    layout: ExportLayout,
}

impl Archiver {
    /// Create an archiver for `layout`
    pub fn new(layout: ExportLayout) -> Self {
        Self { layout }
    }

    /// Archive the working directory of `folder_name` and remove it
    ///
    /// Runs on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`ArchivalError`] if any step up to and including the rename fails.
    /// The working directory is kept in that case and the partial file removed.
    pub async fn archive(&self, folder_name: &str) -> Result<PublishedArchive, ArchivalError> {
        let working_dir = self.layout.working_dir(folder_name);
        let partial = self.layout.partial_archive_path(folder_name);
        let target = self.layout.archive_path(folder_name);

        tracing::info!(
            folder_name = %folder_name,
            working_dir = %working_dir.display(),
            "Archiving export"
        );

        let published = tokio::task::spawn_blocking(move || {
            archive_blocking(&working_dir, &partial, &target)
        })
        .await
        .map_err(|e| ArchivalError::Task(e.to_string()))??;

        tracing::info!(
            folder_name = %folder_name,
            archive = %published.path.display(),
            entries = published.entries,
            "Archive published"
        );

        Ok(published)
    }
}

fn archive_blocking(
    working_dir: &Path,
    partial: &Path,
    target: &Path,
) -> Result<PublishedArchive, ArchivalError> {
    if !working_dir.is_dir() {
        return Err(ArchivalError::MissingDirectory(working_dir.to_path_buf()));
    }

    let entries = match write_partial(working_dir, partial) {
        Ok(entries) => entries,
        Err(e) => {
            discard_partial(partial);
            return Err(e);
        }
    };

    if let Err(e) = std::fs::rename(partial, target) {
        discard_partial(partial);
        return Err(ArchivalError::Publish {
            path: target.to_path_buf(),
            message: e.to_string(),
        });
    }
    sync_parent(target);

    if let Err(e) = std::fs::remove_dir_all(working_dir) {
        tracing::warn!(
            working_dir = %working_dir.display(),
            error = %e,
            "Archive published but working directory could not be removed"
        );
    }

    Ok(PublishedArchive {
        path: target.to_path_buf(),
        entries,
    })
}

/// Write every regular file under `working_dir` into a zip at `partial`
fn write_partial(working_dir: &Path, partial: &Path) -> Result<usize, ArchivalError> {
    let file = File::create(partial).map_err(|e| ArchivalError::Create {
        path: partial.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut entries = 0;

    for entry in WalkDir::new(working_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchivalError::Walk {
            path: working_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(working_dir, entry.path())?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| ArchivalError::AddEntry {
                entry: name.clone(),
                message: e.to_string(),
            })?;

        let mut source = File::open(entry.path()).map_err(|e| ArchivalError::AddEntry {
            entry: name.clone(),
            message: e.to_string(),
        })?;
        io::copy(&mut source, &mut zip).map_err(|e| ArchivalError::AddEntry {
            entry: name.clone(),
            message: e.to_string(),
        })?;

        entries += 1;
    }

    let file = zip.finish().map_err(|e| ArchivalError::Finish {
        path: partial.to_path_buf(),
        message: e.to_string(),
    })?;
    file.sync_all().map_err(|e| ArchivalError::Finish {
        path: partial.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(entries)
}

/// Archive entry name: path relative to the working directory, `/`-separated
fn entry_name(working_dir: &Path, path: &Path) -> Result<String, ArchivalError> {
    let relative = path
        .strip_prefix(working_dir)
        .map_err(|e| ArchivalError::Walk {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn discard_partial(partial: &Path) {
    match std::fs::remove_file(partial) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %partial.display(),
            error = %e,
            "Failed to remove partial archive"
        ),
    }
}

/// Persist the rename. Not every platform can open a directory, so failures are ignored.
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}
