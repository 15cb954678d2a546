//! Persisted session file.
//!
//! The console's stand-in for the browser keeping the provider session:
//! a small JSON file holding the refresh credential so a login survives
//! across runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    refresh_token: String,
}

/// Loads the persisted refresh credential, if any.
///
/// A missing or unreadable file is just an absent session.
pub fn load(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedSession>(&raw) {
        Ok(session) => Some(session.refresh_token),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "session file is malformed, ignoring");
            None
        }
    }
}

/// Saves the refresh credential, creating parent directories as needed.
pub fn save(path: &Path, refresh_token: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let session = PersistedSession {
        refresh_token: refresh_token.to_string(),
    };
    let raw = serde_json::to_string(&session).map_err(io::Error::other)?;
    fs::write(path, raw)
}

/// Removes the persisted session. Missing files are fine.
pub fn clear(path: &Path) {
    if let Err(err) = fs::remove_file(path)
        && err.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %err, "failed to remove session file");
    }
}
