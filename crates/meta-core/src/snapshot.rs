//! Snapshot serialization and filesystem storage.

use std::path::{Path, PathBuf};

use crate::model::SchemaSnapshot;

/// File name of the persisted snapshot inside its directory.
pub const SNAPSHOT_FILE_NAME: &str = "databaseMeta.json";

/// Error type for snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshot directory or file is absent or cannot be read
    #[error("Snapshot not found at {path}: {reason}")]
    NotFound { path: PathBuf, reason: String },

    /// Snapshot file exists but is not a valid snapshot document
    #[error("Failed to parse snapshot {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot content violates a model invariant
    #[error("Invalid snapshot: {0}")]
    Invalid(String),

    /// Snapshot could not be written
    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be serialized or parsed from text
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SnapshotError {
    /// True when there is simply no snapshot to read.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::NotFound { .. })
    }
}

/// Serialize a snapshot to its indented JSON form.
pub fn to_json(snapshot: &SchemaSnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parse a snapshot from its JSON form.
pub fn from_json(json: &str) -> Result<SchemaSnapshot, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Directory-backed snapshot storage.
///
/// Stores a single snapshot as `databaseMeta.json` in a directory. Saving
/// overwrites any previous snapshot.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a new SnapshotStore for the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the full path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE_NAME)
    }

    /// Write the snapshot, creating the directory if needed.
    pub fn save(&self, snapshot: &SchemaSnapshot) -> Result<PathBuf, SnapshotError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path();
        let json = to_json(snapshot)?;
        std::fs::write(&path, json).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            "Stored snapshot to {} ({} domains, {} tables, {} procedures)",
            path.display(),
            snapshot.domains.len(),
            snapshot.tables.len(),
            snapshot.procedures.len()
        );
        Ok(path)
    }

    /// Read and validate the snapshot.
    pub fn load(&self) -> Result<SchemaSnapshot, SnapshotError> {
        if !self.dir.is_dir() {
            return Err(SnapshotError::NotFound {
                path: self.dir.clone(),
                reason: "directory does not exist".to_string(),
            });
        }

        let path = self.path();
        let content = std::fs::read_to_string(&path).map_err(|e| SnapshotError::NotFound {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let snapshot: SchemaSnapshot =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Malformed {
                path: path.clone(),
                source,
            })?;
        snapshot.validate()?;

        tracing::debug!("Loaded snapshot from {}", path.display());
        Ok(snapshot)
    }
}
