//! In-memory state storage for tests.

use crate::{StateStorage, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory storage backend.
///
/// Tracks how many writes it has seen so debounce coalescing can be
/// asserted in tests.
#[derive(Default)]
pub struct MemoryStateStorage {
    values: Mutex<HashMap<String, String>>,
    write_count: AtomicUsize,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls made against this storage.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }
}

impl StateStorage for MemoryStateStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let storage = MemoryStateStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
        assert!(storage.has("k").unwrap());
        assert!(storage.delete("k").unwrap());
        assert_eq!(storage.get("k").unwrap(), None);
        assert!(!storage.has("k").unwrap());
    }

    #[test]
    fn counts_writes() {
        let storage = MemoryStateStorage::new();
        storage.set("k", "1").unwrap();
        storage.set("k", "2").unwrap();
        assert_eq!(storage.write_count(), 2);
    }
}
