//! Catalog entities read from the remote API
//!
//! Playlists and track entries are owned by the catalog service; this crate only
//! reads them. Every field the API may omit is optional so that tracks whose
//! underlying media was deleted, or that lack an artist or album, still
//! deserialize. Unknown fields are kept in `extra` so the JSON output carries the
//! full item as returned by the API.

use crate::domain::ids::PlaylistId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Playlist summary as listed under the current user's playlists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Catalog id
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Owning catalog user
    pub owner: PlaylistOwner,
}

/// Owner of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    /// Catalog user id
    pub id: String,

    /// Display name, if public
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One entry of a playlist's track list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    /// When the track was added to the playlist
    #[serde(default)]
    pub added_at: Option<String>,

    /// The track itself; `None` when the underlying media no longer exists
    #[serde(default)]
    pub track: Option<Track>,

    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Track title
    #[serde(default)]
    pub name: Option<String>,

    /// Credited artists, first one is the primary artist
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artists: Vec<Artist>,

    /// Album the track belongs to
    #[serde(default)]
    pub album: Option<Album>,

    /// Public links
    #[serde(default)]
    pub external_urls: Option<ExternalUrls>,

    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Treat an explicit `null` list the same as a missing one
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An artist credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    /// Artist name
    #[serde(default)]
    pub name: Option<String>,

    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An album reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Album name
    #[serde(default)]
    pub name: Option<String>,

    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Public links for a catalog object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    /// Link to the object on Spotify
    #[serde(default)]
    pub spotify: Option<String>,
}

/// The user the API client is authenticated as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Catalog user id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Public links
    #[serde(default)]
    pub external_urls: Option<ExternalUrls>,
}

impl CurrentUser {
    /// Link to the user's public profile, if the API returned one
    pub fn profile_url(&self) -> Option<&str> {
        self.external_urls
            .as_ref()
            .and_then(|urls| urls.spotify.as_deref())
    }
}

/// Flattened CSV row for one track entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRow {
    /// Primary artist name
    #[serde(rename = "Artist")]
    pub artist: String,

    /// Track title
    #[serde(rename = "Song title")]
    pub title: String,

    /// Album name
    #[serde(rename = "Album")]
    pub album: String,

    /// Date the track was added to the playlist
    #[serde(rename = "Date added to playlist")]
    pub date_added: String,

    /// Public track URL
    #[serde(rename = "Spotify URL")]
    pub url: String,
}

impl TrackRow {
    /// CSV header, in column order
    pub const HEADERS: [&'static str; 5] = [
        "Artist",
        "Song title",
        "Album",
        "Date added to playlist",
        "Spotify URL",
    ];
}

impl From<&TrackItem> for TrackRow {
    fn from(item: &TrackItem) -> Self {
        let track = item.track.as_ref();
        Self {
            artist: track
                .and_then(|t| t.artists.first())
                .and_then(|a| a.name.clone())
                .unwrap_or_default(),
            title: track.and_then(|t| t.name.clone()).unwrap_or_default(),
            album: track
                .and_then(|t| t.album.as_ref())
                .and_then(|a| a.name.clone())
                .unwrap_or_default(),
            date_added: item.added_at.clone().unwrap_or_default(),
            url: track
                .and_then(|t| t.external_urls.as_ref())
                .and_then(|u| u.spotify.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_track_item_flattens() {
        let item: TrackItem = serde_json::from_value(json!({
            "added_at": "2023-06-01T12:00:00Z",
            "track": {
                "name": "Song",
                "artists": [{"name": "First"}, {"name": "Second"}],
                "album": {"name": "Record"},
                "external_urls": {"spotify": "https://open.spotify.com/track/abc"},
                "popularity": 55
            }
        }))
        .unwrap();

        let row = TrackRow::from(&item);
        assert_eq!(row.artist, "First");
        assert_eq!(row.title, "Song");
        assert_eq!(row.album, "Record");
        assert_eq!(row.date_added, "2023-06-01T12:00:00Z");
        assert_eq!(row.url, "https://open.spotify.com/track/abc");
    }

    #[test]
    fn test_deleted_track_yields_empty_fields() {
        let item: TrackItem =
            serde_json::from_value(json!({"added_at": "2023-06-01T12:00:00Z", "track": null}))
                .unwrap();

        let row = TrackRow::from(&item);
        assert_eq!(row.artist, "");
        assert_eq!(row.title, "");
        assert_eq!(row.album, "");
        assert_eq!(row.url, "");
        assert_eq!(row.date_added, "2023-06-01T12:00:00Z");
    }

    #[test]
    fn test_missing_artist_and_album() {
        let item: TrackItem =
            serde_json::from_value(json!({"track": {"name": "Lonely", "artists": []}})).unwrap();

        let row = TrackRow::from(&item);
        assert_eq!(row.artist, "");
        assert_eq!(row.album, "");
        assert_eq!(row.title, "Lonely");
        assert_eq!(row.date_added, "");
    }

    #[test]
    fn test_null_artists_yield_empty_artist() {
        let item: TrackItem = serde_json::from_value(json!({
            "added_at": "2023-06-01T12:00:00Z",
            "track": {"name": "Untitled", "artists": null, "album": {"name": "Demos"}}
        }))
        .unwrap();

        let row = TrackRow::from(&item);
        assert_eq!(row.artist, "");
        assert_eq!(row.title, "Untitled");
        assert_eq!(row.album, "Demos");
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = json!({
            "added_at": "2023-06-01T12:00:00Z",
            "is_local": false,
            "track": {"name": "Song", "artists": [], "duration_ms": 1000}
        });
        let item: TrackItem = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&item).unwrap();

        assert_eq!(back["is_local"], json!(false));
        assert_eq!(back["track"]["duration_ms"], json!(1000));
    }

    #[test]
    fn test_current_user_profile_url() {
        let user: CurrentUser = serde_json::from_value(json!({
            "id": "alice",
            "display_name": "Alice",
            "external_urls": {"spotify": "https://open.spotify.com/user/alice"}
        }))
        .unwrap();
        assert_eq!(
            user.profile_url(),
            Some("https://open.spotify.com/user/alice")
        );
    }
}
