//! Filesystem store: `{root}/{tier}/{table}/{timestamp}.{ext}`.

use super::{SnapshotStore, StorageError};
use crate::domain::{SnapshotRef, TableLocation, Tier};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding one subdirectory per tier.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{tier}`
    pub fn tier_root(&self, tier: Tier) -> PathBuf {
        self.root.join(tier.as_str())
    }

    /// `{root}/{tier}/{table}`
    pub fn table_dir(&self, location: &TableLocation) -> PathBuf {
        self.tier_root(location.tier).join(&location.table)
    }

    pub fn snapshot_path(&self, snapshot: &SnapshotRef) -> PathBuf {
        self.table_dir(&snapshot.location).join(snapshot.file_name())
    }

    /// Size in bytes of a stored snapshot.
    pub fn size(&self, snapshot: &SnapshotRef) -> Result<u64, StorageError> {
        let path = self.snapshot_path(snapshot);
        fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| StorageError::io(path, e))
    }
}

impl SnapshotStore for FsStore {
    fn list(&self, location: &TableLocation) -> Result<Vec<SnapshotRef>, StorageError> {
        let dir = self.table_dir(location);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(dir, e)),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| StorageError::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            // Temp files, sidecars and anything hand-placed are not snapshots.
            let name = entry.file_name();
            if let Some(snapshot) = name
                .to_str()
                .and_then(|n| SnapshotRef::parse_file_name(location, n))
            {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    fn read(&self, snapshot: &SnapshotRef) -> Result<Vec<u8>, StorageError> {
        let path = self.snapshot_path(snapshot);
        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::Missing(snapshot.to_string())
            } else {
                StorageError::io(path, e)
            }
        })
    }

    fn append(&self, snapshot: &SnapshotRef, bytes: &[u8]) -> Result<(), StorageError> {
        let dir = self.table_dir(&snapshot.location);
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let path = dir.join(snapshot.file_name());
        let tmp_path = dir.join(format!(".{}.tmp", snapshot.file_name()));

        let mut tmp = fs::File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.sync_all())
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                StorageError::io(&tmp_path, e)
            })?;
        drop(tmp);

        // Hard-link into place: atomic, and refuses to replace an existing file.
        let linked = fs::hard_link(&tmp_path, &path);
        let _ = fs::remove_file(&tmp_path);
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path.display().to_string()))
            }
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn describe(&self, snapshot: &SnapshotRef) -> String {
        self.snapshot_path(snapshot).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SnapshotFormat;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_root() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("oilregime_fs_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn snap(id: &str, format: SnapshotFormat) -> SnapshotRef {
        SnapshotRef {
            location: TableLocation::new(Tier::Bronze, "bronze_eia_prices"),
            id: id.parse().unwrap(),
            format,
        }
    }

    #[test]
    fn missing_table_lists_empty() {
        let root = temp_root();
        let store = FsStore::new(&root);
        let loc = TableLocation::new(Tier::Gold, "gold_eia_prices");
        assert!(store.list(&loc).unwrap().is_empty());
    }

    #[test]
    fn append_creates_layout_and_refuses_overwrite() {
        let root = temp_root();
        let store = FsStore::new(&root);
        let s = snap("20240105T153045Z", SnapshotFormat::Csv);

        store.append(&s, b"a\n1\n").unwrap();
        assert!(root
            .join("bronze/bronze_eia_prices/20240105T153045Z.csv")
            .is_file());

        let err = store.append(&s, b"a\n2\n").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.read(&s).unwrap(), b"a\n1\n");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn list_skips_foreign_files() {
        let root = temp_root();
        let store = FsStore::new(&root);
        let s = snap("20240105T153045Z", SnapshotFormat::Parquet);
        store.append(&s, b"PAR1").unwrap();

        let dir = store.table_dir(&s.location);
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join("20240106T000000Z.parquet.tmp"), "x").unwrap();
        fs::create_dir_all(dir.join("20240107T000000Z.csv")).unwrap();

        let listed = store.list(&s.location).unwrap();
        assert_eq!(listed, vec![s]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn read_missing_snapshot() {
        let root = temp_root();
        let store = FsStore::new(&root);
        let err = store
            .read(&snap("20240105T153045Z", SnapshotFormat::Csv))
            .unwrap_err();
        assert!(matches!(err, StorageError::Missing(_)));
    }
}
