//! Debounced draft persistence.

use crate::{StateStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Coalescing window for draft writes. Keystrokes arriving within this
/// window collapse into a single storage write.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Identity of a draft slot.
///
/// A draft belongs to a `(user, record)` pair. An anonymous editor uses
/// `anon`, and a record not yet saved remotely uses `new`, so a signed-out
/// scratch note and a signed-in edit of record `42` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey(String);

impl DraftKey {
    /// Build the key for a user/record pair.
    pub fn for_parts(user_id: Option<&str>, record_id: Option<&str>) -> Self {
        let user = user_id.unwrap_or("anon");
        let record = record_id.unwrap_or("new");
        Self(format!("{}|{}", user, record))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Editor field snapshot captured in a draft.
///
/// Everything is stored as entered, untrimmed. `mood` stays a string
/// because a half-typed number is still worth restoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFields {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub body: String,
}

struct Inner {
    drafts: HashMap<String, DraftFields>,
    generation: u64,
    persisted_generation: u64,
}

/// Draft durability layer.
///
/// Holds the live draft map in memory and writes the whole map to storage
/// as one JSON blob under [`StorageKeys::DRAFTS`]. Writes triggered by
/// [`save_debounced`](DraftStore::save_debounced) coalesce over
/// [`DEBOUNCE_WINDOW`]; [`flush`](DraftStore::flush) forces any pending
/// state out immediately (for shutdown paths).
pub struct DraftStore {
    storage: Arc<dyn StateStorage>,
    inner: Arc<Mutex<Inner>>,
}

impl DraftStore {
    /// Create a store, loading any previously persisted drafts.
    pub fn new(storage: Arc<dyn StateStorage>) -> StorageResult<Self> {
        let drafts = match storage.get(StorageKeys::DRAFTS)? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => HashMap::new(),
        };
        Ok(Self {
            storage,
            inner: Arc::new(Mutex::new(Inner {
                drafts,
                generation: 0,
                persisted_generation: 0,
            })),
        })
    }

    /// Record a draft update and schedule a coalesced write.
    ///
    /// The write happens [`DEBOUNCE_WINDOW`] after the last update. Later
    /// updates supersede the scheduled write, so a burst of keystrokes
    /// produces a single storage write.
    pub fn save_debounced(&self, key: &DraftKey, fields: DraftFields) {
        let generation = {
            let mut inner = self.lock();
            inner.drafts.insert(key.as_str().to_string(), fields);
            inner.generation += 1;
            inner.generation
        };
        let storage = Arc::clone(&self.storage);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_WINDOW).await;
            let blob = {
                let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
                // Superseded by a later update, or already flushed.
                if guard.generation != generation || guard.persisted_generation >= generation {
                    return;
                }
                guard.persisted_generation = generation;
                serde_json::to_string(&guard.drafts)
            };
            match blob {
                Ok(blob) => {
                    if let Err(e) = storage.set(StorageKeys::DRAFTS, &blob) {
                        tracing::warn!(error = %e, "failed to persist drafts");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode drafts"),
            }
        });
    }

    /// Record a draft update and write it out immediately.
    pub fn save_now(&self, key: &DraftKey, fields: DraftFields) -> StorageResult<()> {
        {
            let mut inner = self.lock();
            inner.drafts.insert(key.as_str().to_string(), fields);
            inner.generation += 1;
        }
        self.persist()
    }

    /// Write any pending draft state out immediately.
    pub fn flush(&self) -> StorageResult<()> {
        let dirty = {
            let inner = self.lock();
            inner.generation != inner.persisted_generation
        };
        if dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// Fetch the draft for a slot, if one worth restoring exists.
    ///
    /// A draft with an empty body is treated as absent. Titles and tags
    /// without body text are not worth interrupting the user over.
    pub fn restore(&self, key: &DraftKey) -> Option<DraftFields> {
        let inner = self.lock();
        inner
            .drafts
            .get(key.as_str())
            .filter(|fields| !fields.body.trim().is_empty())
            .cloned()
    }

    /// Discard the draft for a slot and persist the removal.
    pub fn clear(&self, key: &DraftKey) -> StorageResult<()> {
        let removed = {
            let mut inner = self.lock();
            let removed = inner.drafts.remove(key.as_str()).is_some();
            if removed {
                inner.generation += 1;
            }
            removed
        };
        if removed {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> StorageResult<()> {
        let blob = {
            let mut inner = self.lock();
            inner.persisted_generation = inner.generation;
            serde_json::to_string(&inner.drafts)?
        };
        self.storage.set(StorageKeys::DRAFTS, &blob)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
