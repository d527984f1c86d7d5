//! Event-loop coordination for the Wired Journal client.
//!
//! The orchestrator is the single writer over client-visible sync state:
//! the record cache, the status line and change notifications. It
//! consumes [`SyncTrigger`]s one at a time, so concurrent UI events
//! (a save racing a refresh racing a foreground resume) serialize into
//! an order a user can reason about.

mod filter;
mod orchestrator;
pub mod status;
mod trigger;

pub use filter::RecordFilter;
pub use orchestrator::{EditorContent, SyncOrchestrator};
pub use trigger::{trigger_channel, SyncNotification, SyncTrigger};
