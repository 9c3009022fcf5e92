//! Binary session snapshots.
//!
//! A snapshot holds the drag state of one session (pending overrides and
//! active gestures) so it can be handed to another process or inspected
//! after a replay.  Snapshots are encoded with `bincode`, the same compact
//! binary format used for every other persisted engine record.
//!
//! Files are named `<session-id>.snapshot` inside the configured directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::application::process_events::SessionSnapshot;

/// File extension of snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error accessing snapshot at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] bincode::Error),
}

/// Encodes `snapshot` into its binary form.
pub fn encode_snapshot(snapshot: &SessionSnapshot) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(snapshot)?)
}

/// Decodes a snapshot produced by [`encode_snapshot`].
pub fn decode_snapshot(bytes: &[u8]) -> Result<SessionSnapshot, SnapshotError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Path of the snapshot file for `snapshot` inside `dir`.
pub fn snapshot_path(dir: &Path, snapshot: &SessionSnapshot) -> PathBuf {
    dir.join(format!("{}.{SNAPSHOT_EXTENSION}", snapshot.session))
}

/// Writes `snapshot` into `dir`, creating the directory if needed.
///
/// Returns the path of the written file.
pub fn write_snapshot(dir: &Path, snapshot: &SessionSnapshot) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = snapshot_path(dir, snapshot);
    let bytes = encode_snapshot(snapshot)?;
    std::fs::write(&path, &bytes).map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;

    info!(
        session = %snapshot.session,
        path = %path.display(),
        bytes = bytes.len(),
        "snapshot written"
    );
    Ok(path)
}

/// Reads a snapshot file written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<SessionSnapshot, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = decode_snapshot(&bytes)?;
    debug!(session = %snapshot.session, path = %path.display(), "snapshot read");
    Ok(snapshot)
}
