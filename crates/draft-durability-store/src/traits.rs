//! Storage trait definitions.

use crate::StorageResult;

/// Trait for durable key/value string storage backends.
pub trait StateStorage: Send + Sync {
    /// Store a value under a key, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns true if something was removed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
