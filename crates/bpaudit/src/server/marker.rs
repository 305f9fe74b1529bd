//! Server Marker File
//!
//! After the listener binds, a small JSON file is dropped in the project
//! directory so editor-side clients can discover the port without scanning.
//! The file is deleted on shutdown; a stale marker from a crashed process is
//! simply overwritten by the next server.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Name of the marker file in the project directory
pub const MARKER_FILE: &str = ".bpaudit-server.json";

/// Contents of the marker file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMarker {
    pub port: u16,
    pub pid: u32,
    pub started: DateTime<Utc>,
}

/// Write the marker file, returning its path
pub fn write_marker(project_dir: &Path, port: u16) -> std::io::Result<PathBuf> {
    let marker = ServerMarker {
        port,
        pid: std::process::id(),
        started: Utc::now(),
    };
    let path = project_dir.join(MARKER_FILE);
    let json = serde_json::to_string_pretty(&marker).map_err(std::io::Error::other)?;
    std::fs::write(&path, json)?;
    info!("Wrote server marker: {}", path.display());
    Ok(path)
}

/// Delete the marker file (best effort)
pub fn remove_marker(project_dir: &Path) {
    let path = project_dir.join(MARKER_FILE);
    if path.exists() {
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Failed to remove server marker {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_marker(dir.path(), 19902).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let marker: ServerMarker = serde_json::from_str(&content).unwrap();
        assert_eq!(marker.port, 19902);
        assert_eq!(marker.pid, std::process::id());

        remove_marker(dir.path());
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_marker_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        remove_marker(dir.path());
    }
}
