//! File-backed state storage.

use crate::{StateStorage, StorageError, StorageResult};
use std::path::PathBuf;

/// State storage writing one file per key under a directory.
///
/// Keys are restricted to the well-known constants in
/// [`StorageKeys`](crate::StorageKeys) in practice, so no escaping is
/// attempted beyond rejecting path separators.
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    /// Create a storage rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> StorageResult<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains('/') || key.contains('\\') {
            return Err(StorageError::Backend(format!(
                "invalid storage key: {}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StateStorage for FileStateStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        // Write-then-rename keeps a crash from truncating the blob.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_storage() -> (tempfile::TempDir, FileStateStorage) {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStateStorage::new(tmp.path().join("state")).unwrap();
        (tmp, storage)
    }

    #[test]
    fn set_get_round_trip() {
        let (_tmp, storage) = make_storage();
        storage.set("wired_test", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get("wired_test").unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn get_missing_returns_none() {
        let (_tmp, storage) = make_storage();
        assert_eq!(storage.get("absent").unwrap(), None);
    }

    #[test]
    fn delete_removes_value() {
        let (_tmp, storage) = make_storage();
        storage.set("k", "v").unwrap();
        assert!(storage.delete("k").unwrap());
        assert!(!storage.delete("k").unwrap());
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn overwrite_replaces_value() {
        let (_tmp, storage) = make_storage();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("two".to_string()));
    }

    #[test]
    fn rejects_path_separator_keys() {
        let (_tmp, storage) = make_storage();
        assert!(storage.set("../escape", "v").is_err());
    }

    #[test]
    fn survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("state");
        {
            let storage = FileStateStorage::new(dir.clone()).unwrap();
            storage.set("k", "persisted").unwrap();
        }
        let storage = FileStateStorage::new(dir).unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("persisted".to_string()));
    }
}
