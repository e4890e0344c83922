//! JSON and CSV output for one playlist

use super::naming::playlist_file_stem;
use crate::domain::{Playlist, TrackItem, TrackRow, WriteError};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PlaylistDocument<'a> {
    playlist_name: &'a str,
    owner_id: &'a str,
    tracks: &'a [TrackItem],
}

/// Paths written for one playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    /// Pretty-printed JSON document
    pub json: PathBuf,
    /// CSV with one row per track entry
    pub csv: PathBuf,
}

/// Writes playlist files into an export's working directory
#[derive(Debug, Clone, Default)]
pub struct FileWriter;

impl FileWriter {
    /// Create a writer
    pub fn new() -> Self {
        Self
    }

    /// Write `{stem}.json` and `{stem}.csv` for `playlist` into `working_dir`
    ///
    /// The stem is derived from the playlist owner's id and the playlist name.
    /// Existing files with the same stem are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the directory cannot be created, encoding fails
    /// or a file cannot be written.
    pub async fn write(
        &self,
        working_dir: &Path,
        playlist: &Playlist,
        tracks: &[TrackItem],
    ) -> Result<WrittenFiles, WriteError> {
        tokio::fs::create_dir_all(working_dir)
            .await
            .map_err(|e| WriteError::CreateDirectory {
                path: working_dir.to_path_buf(),
                message: e.to_string(),
            })?;

        let stem = playlist_file_stem(&playlist.owner.id, &playlist.name, playlist.id.as_str());
        let files = WrittenFiles {
            json: working_dir.join(format!("{stem}.json")),
            csv: working_dir.join(format!("{stem}.csv")),
        };

        let json = render_json(playlist, tracks)?;
        write_file(&files.json, json).await?;

        let csv = render_csv(tracks)?;
        write_file(&files.csv, csv).await?;

        tracing::debug!(
            playlist_id = %playlist.id,
            track_count = tracks.len(),
            file_stem = %stem,
            "Wrote playlist files"
        );

        Ok(files)
    }
}

fn render_json(playlist: &Playlist, tracks: &[TrackItem]) -> Result<Vec<u8>, WriteError> {
    let document = PlaylistDocument {
        playlist_name: &playlist.name,
        owner_id: &playlist.owner.id,
        tracks,
    };
    serde_json::to_vec_pretty(&document).map_err(|e| WriteError::Encode(e.to_string()))
}

fn render_csv(tracks: &[TrackItem]) -> Result<Vec<u8>, WriteError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(TrackRow::HEADERS)?;
    for item in tracks {
        writer.serialize(TrackRow::from(item))?;
    }

    writer
        .into_inner()
        .map_err(|e| WriteError::Encode(e.to_string()))
}

async fn write_file(path: &Path, contents: Vec<u8>) -> Result<(), WriteError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| WriteError::WriteFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::PlaylistId;
    use crate::domain::PlaylistOwner;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn playlist(owner: &str, name: &str) -> Playlist {
        Playlist {
            id: PlaylistId::new("pl1").unwrap(),
            name: name.to_string(),
            owner: PlaylistOwner {
                id: owner.to_string(),
                display_name: None,
            },
        }
    }

    fn tracks() -> Vec<TrackItem> {
        serde_json::from_value(json!([
            {
                "added_at": "2023-06-01T12:00:00Z",
                "track": {
                    "name": "Song, with comma",
                    "artists": [{"name": "Artist"}],
                    "album": {"name": "Album"},
                    "external_urls": {"spotify": "https://open.spotify.com/track/1"}
                }
            },
            {"added_at": "2023-06-02T12:00:00Z", "track": null}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_writes_both_files_with_sanitized_stem() {
        let dir = TempDir::new().unwrap();
        let files = FileWriter::new()
            .write(dir.path(), &playlist("42", "Summer '23!! Mix"), &tracks())
            .await
            .unwrap();

        assert_eq!(files.json, dir.path().join("42-Summer-23-Mix.json"));
        assert_eq!(files.csv, dir.path().join("42-Summer-23-Mix.csv"));
        assert!(files.json.exists());
        assert!(files.csv.exists());
    }

    #[tokio::test]
    async fn test_json_document_shape() {
        let dir = TempDir::new().unwrap();
        let files = FileWriter::new()
            .write(dir.path(), &playlist("42", "Road Trip"), &tracks())
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&files.json).unwrap();
        assert!(raw.contains("\n  \"playlist_name\""));
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["playlist_name"], "Road Trip");
        assert_eq!(doc["owner_id"], "42");
        assert_eq!(doc["tracks"].as_array().unwrap().len(), 2);
        assert_eq!(doc["tracks"][0]["track"]["name"], "Song, with comma");
    }

    #[tokio::test]
    async fn test_csv_rows_with_missing_fields() {
        let dir = TempDir::new().unwrap();
        let files = FileWriter::new()
            .write(dir.path(), &playlist("42", "Road Trip"), &tracks())
            .await
            .unwrap();

        let mut reader = csv::Reader::from_path(&files.csv).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec!["Artist", "Song title", "Album", "Date added to playlist", "Spotify URL"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Song, with comma");
        assert_eq!(&rows[1][0], "");
        assert_eq!(&rows[1][3], "2023-06-02T12:00:00Z");
        assert_eq!(&rows[1][4], "");
    }

    #[tokio::test]
    async fn test_empty_playlist_still_has_header() {
        let dir = TempDir::new().unwrap();
        let files = FileWriter::new()
            .write(dir.path(), &playlist("42", "Empty"), &[])
            .await
            .unwrap();

        let csv = std::fs::read_to_string(&files.csv).unwrap();
        assert_eq!(
            csv.trim_end(),
            "Artist,Song title,Album,Date added to playlist,Spotify URL"
        );
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = FileWriter::new()
            .write(&blocker, &playlist("42", "Mix"), &tracks())
            .await;

        assert!(matches!(result, Err(WriteError::CreateDirectory { .. })));
    }
}
