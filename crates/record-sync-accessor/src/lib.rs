//! Retrying remote access to journal records.
//!
//! Sits between the UI-facing orchestrator and the raw Supabase gateway.
//! The accessor's job is to make a single logical operation (list, save,
//! delete) survive the failures that deserve surviving: expired tokens
//! get one reconcile-and-retry, transient network trouble and rate
//! limits get a small bounded retry budget, and outright rejections fail
//! immediately.
//!
//! Saves carry a durability guarantee: the editor input is written to
//! the draft store before the network is touched and removed only after
//! the remote acknowledges, so an offline save loses nothing.

mod accessor;
mod error;
mod retry;

pub use accessor::{RecordAccessor, RecordInput, SaveOutcome};
pub use error::{AccessError, AccessResult};
pub use retry::RetryPolicy;
