//! In-memory store for tests and dry runs.

use super::{SnapshotStore, StorageError};
use crate::domain::{SnapshotRef, TableLocation};
use std::sync::{Mutex, MutexGuard};

/// Keeps snapshots in insertion order. `list` returns them in that order,
/// which need not be chronological.
#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<Vec<(SnapshotRef, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<(SnapshotRef, Vec<u8>)>> {
        self.snapshots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Total snapshots across all tables.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    fn list(&self, location: &TableLocation) -> Result<Vec<SnapshotRef>, StorageError> {
        Ok(self
            .guard()
            .iter()
            .filter(|(s, _)| s.location == *location)
            .map(|(s, _)| s.clone())
            .collect())
    }

    fn read(&self, snapshot: &SnapshotRef) -> Result<Vec<u8>, StorageError> {
        self.guard()
            .iter()
            .find(|(s, _)| s == snapshot)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| StorageError::Missing(snapshot.to_string()))
    }

    fn append(&self, snapshot: &SnapshotRef, bytes: &[u8]) -> Result<(), StorageError> {
        let mut guard = self.guard();
        // Same id in another format would be a second file on disk, so only an
        // exact match collides.
        if guard.iter().any(|(s, _)| s == snapshot) {
            return Err(StorageError::AlreadyExists(snapshot.to_string()));
        }
        guard.push((snapshot.clone(), bytes.to_vec()));
        Ok(())
    }

    fn describe(&self, snapshot: &SnapshotRef) -> String {
        format!("memory://{snapshot}")
    }
}
