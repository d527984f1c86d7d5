//! Sync triggers and notifications.

use record_sync_accessor::RecordInput;
use session_reconciler::SessionState;
use tokio::sync::mpsc;

/// Capacity of the trigger queue.
const TRIGGER_QUEUE_CAPACITY: usize = 64;

/// Create the trigger queue consumed by
/// [`SyncOrchestrator::run`](crate::SyncOrchestrator::run).
pub fn trigger_channel() -> (mpsc::Sender<SyncTrigger>, mpsc::Receiver<SyncTrigger>) {
    mpsc::channel(TRIGGER_QUEUE_CAPACITY)
}

/// Events that drive the orchestrator loop.
///
/// Triggers are consumed strictly one at a time, in arrival order. A
/// save enqueued before a refresh completes before the refresh starts.
#[derive(Debug)]
pub enum SyncTrigger {
    /// Full fetch of the record list.
    Refresh,
    /// The client came back to the foreground. Lightweight: verifies the
    /// session only, never refetches the list.
    VisibilityResumed,
    /// The session state changed out from under us.
    AuthStateChanged(SessionState),
    /// An editor opened for a record (`None` for a new entry).
    OpenEditor(Option<String>),
    /// Save editor input, then refetch.
    Save(RecordInput),
    /// Delete a record, then refetch.
    Delete(String),
}

/// Broadcast events for anything rendering orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotification {
    /// The cached record list changed.
    RecordsChanged,
    /// The session moved to a new state.
    SessionStateChanged(SessionState),
}
