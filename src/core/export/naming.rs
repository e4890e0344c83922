//! Filesystem-safe names for playlist output files

/// Replace every character outside `[A-Za-z0-9]` with `-`, collapse runs of `-`
/// and trim leading and trailing `-`
///
/// The result only contains ASCII alphanumerics and single hyphens, and
/// sanitizing it again returns it unchanged. It may be empty.
pub fn sanitize_file_stem(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Base name shared by a playlist's `.json` and `.csv` files
///
/// Built from the playlist owner's id and the playlist name. Two playlists that
/// sanitize to the same stem share files and the later write wins. Falls back
/// to the playlist id when nothing alphanumeric remains.
pub fn playlist_file_stem(owner_id: &str, playlist_name: &str, playlist_id: &str) -> String {
    let stem = sanitize_file_stem(&format!("{owner_id}-{playlist_name}"));
    if stem.is_empty() {
        let fallback = sanitize_file_stem(playlist_id);
        if fallback.is_empty() {
            return "playlist".to_string();
        }
        return fallback;
    }
    stem
}
