//! Snapshot storage.
//!
//! The directory tree is the only shared mutable resource in the pipeline, so
//! it sits behind an explicit interface with three operations: list, read,
//! append. Append never replaces an existing snapshot and nothing here
//! deletes one.

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::domain::{SnapshotRef, TableLocation};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot already exists: {0}")]
    AlreadyExists(String),

    #[error("snapshot does not exist: {0}")]
    Missing(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Append-only snapshot storage.
pub trait SnapshotStore: Send + Sync {
    /// Every snapshot of a table, in no particular order. A table that was
    /// never written lists empty.
    fn list(&self, location: &TableLocation) -> Result<Vec<SnapshotRef>, StorageError>;

    /// Raw bytes of one snapshot.
    fn read(&self, snapshot: &SnapshotRef) -> Result<Vec<u8>, StorageError>;

    /// Store a new snapshot. Fails with `AlreadyExists` rather than replace.
    fn append(&self, snapshot: &SnapshotRef, bytes: &[u8]) -> Result<(), StorageError>;

    /// Human-readable location of a snapshot, for reports and logs.
    fn describe(&self, snapshot: &SnapshotRef) -> String;
}
