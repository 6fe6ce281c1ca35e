use crate::core::snapshot::Snapshot;
use crate::core::storage::Storage;
use log::{debug, warn};
use std::io;
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  Snapshot Store
-------------------------------------------------------------------------------------------------*/

/// Loads and persists a [Snapshot] at one path through a [Storage] capability.
pub struct SnapshotStore<'s, S: Storage + ?Sized> {
    storage: &'s S,
    path: &'s Path,
}

impl<'s, S: Storage + ?Sized> SnapshotStore<'s, S> {
    pub fn new(storage: &'s S, path: &'s Path) -> Self {
        Self { storage, path }
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    /// Read and parse the persisted snapshot. A missing, unreadable, or unparsable file all
    /// yield `None`.
    pub fn load(&self) -> Option<Snapshot> {
        let bytes = self
            .storage
            .read(self.path)
            .inspect_err(|error| debug!("Cache file {:?} is not readable: {}", self.path, error))
            .ok()?;

        serde_json::from_slice::<Snapshot>(&bytes)
            .inspect(|snapshot| {
                debug!(
                    "Loaded snapshot from {:?} ({} prefixes, timestamp {})",
                    self.path,
                    snapshot.prefixes.len(),
                    snapshot.timestamp
                )
            })
            .inspect_err(|error| debug!("Cache file {:?} is not a snapshot: {}", self.path, error))
            .ok()
    }

    /// Serialize the snapshot and replace whatever was stored before.
    pub fn save(&self, snapshot: &Snapshot) -> io::Result<()> {
        let json = snapshot.to_json()?;
        self.storage.write(self.path, json.as_bytes())
    }

    /// Remove the persisted snapshot. When the file cannot be deleted it is overwritten with an
    /// empty payload instead, which `load()` reports as absent.
    pub fn clear(&self) -> io::Result<()> {
        if !self.storage.exists(self.path) {
            debug!("No cache file to delete at {:?}", self.path);
            return Ok(());
        }

        match self.storage.delete(self.path) {
            Ok(()) => {
                debug!("Deleted cache file {:?}", self.path);
                Ok(())
            }
            Err(error) => {
                warn!(
                    "Could not delete cache file {:?} ({}); writing an empty one instead",
                    self.path, error
                );
                self.storage.write(self.path, b"")
            }
        }
    }

    /// Whether anything is stored at the path. Diagnostic only; use `load()` to decide.
    pub fn has_persisted(&self) -> bool {
        self.storage.exists(self.path)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::tests::test_entries;
    use crate::core::storage::tests::MemoryStorage;
    use crate::core::storage::FileStorage;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;
    use test_log::test;

    fn cache_path() -> PathBuf {
        PathBuf::from("/cache/ip-ranges.json")
    }

    #[test]
    fn test_load_missing_file_is_absent() {
        let storage = MemoryStorage::default();
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        assert!(store.load().is_none());
        assert!(!store.has_persisted());
    }

    #[test]
    fn test_load_corrupt_file_is_absent() {
        let storage = MemoryStorage::default();
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        let payloads: [&[u8]; 5] = [b"", b"{", b"[]", b"{\"timestamp\": 5}", b"\xff\xfe"];
        for contents in payloads {
            storage.insert(&path, contents);
            assert!(store.has_persisted());
            assert!(store.load().is_none());
        }
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::default();
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        let first = Snapshot::new(Utc::now(), test_entries());
        store.save(&first).unwrap();
        assert_eq!(store.load(), Some(first));

        let second = Snapshot::new(Utc::now(), vec![]);
        store.save(&second).unwrap();
        assert_eq!(store.load(), Some(second));
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let storage = MemoryStorage::default();
        storage.fail_writes.store(true, Ordering::SeqCst);
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        assert!(store.save(&Snapshot::new(Utc::now(), vec![])).is_err());
        assert!(!store.has_persisted());
    }

    #[test]
    fn test_clear_deletes_snapshot() {
        let storage = MemoryStorage::default();
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        store.save(&Snapshot::new(Utc::now(), test_entries())).unwrap();
        store.clear().unwrap();
        assert!(!store.has_persisted());
        assert!(store.load().is_none());

        // Clearing an empty store is a no-op
        store.clear().unwrap();
    }

    #[test]
    fn test_clear_falls_back_to_empty_payload() {
        let storage = MemoryStorage::default();
        storage.fail_deletes.store(true, Ordering::SeqCst);
        let path = cache_path();
        let store = SnapshotStore::new(&storage, &path);

        store.save(&Snapshot::new(Utc::now(), test_entries())).unwrap();
        store.clear().unwrap();
        assert_eq!(storage.contents(&path), Some(vec![]));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_snapshot_never_absent_during_saves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ip-ranges.json");
        let store = SnapshotStore::new(&FileStorage, &path);

        let full = Snapshot::new(Utc::now(), std::iter::repeat(test_entries()).take(200).flatten().collect());
        let empty = Snapshot::new(Utc::now(), vec![]);
        store.save(&full).unwrap();

        let done = AtomicBool::new(false);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..200 {
                    let snapshot = if round % 2 == 0 { &empty } else { &full };
                    store.save(snapshot).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            for _ in 0..2 {
                scope.spawn(|| {
                    while !done.load(Ordering::SeqCst) {
                        let loaded = store.load().expect("snapshot vanished during a save");
                        assert!(loaded == full || loaded == empty);
                    }
                });
            }
        });
        assert_eq!(store.load(), Some(full));
    }
}
