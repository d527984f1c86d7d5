//! Local durable state for the Wired Journal client.
//!
//! Two things live here:
//!
//! - [`StateStorage`], a small key/value trait over durable string blobs,
//!   with a file-backed implementation for real use and an in-memory one
//!   for tests (and for the persisted session, which shares the backend).
//! - [`DraftStore`], the draft durability layer: in-progress editor content
//!   keyed by `(user, record)`, written through a debounced coalescing
//!   window so rapid keystrokes don't each hit the disk.
//!
//! A draft is advisory. It is never sent to the remote service; it only
//! repopulates an editor after a crash, reload, or failed save.

mod draft;
mod error;
mod file;
mod keys;
mod memory;
mod traits;

pub use draft::{DraftFields, DraftKey, DraftStore, DEBOUNCE_WINDOW};
pub use error::{StorageError, StorageResult};
pub use file::FileStateStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStateStorage;
pub use traits::StateStorage;
