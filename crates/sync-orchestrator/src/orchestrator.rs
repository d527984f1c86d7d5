//! The sync orchestrator event loop.

use crate::filter::RecordFilter;
use crate::status;
use crate::trigger::{SyncNotification, SyncTrigger};
use draft_durability_store::{DraftFields, DraftKey, DraftStore};
use journal_supabase_gateway::{AuthApi, LogRecord, RecordsApi};
use record_sync_accessor::{AccessError, RecordAccessor, RecordInput};
use session_reconciler::{SessionReconciler, SessionState};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};

/// Capacity of the notification fan-out.
const NOTIFY_CAPACITY: usize = 32;

/// Coordinates session, records and drafts behind a single event loop.
///
/// All remote work funnels through [`run`](SyncOrchestrator::run), which
/// consumes triggers strictly one at a time. That sequencing is the
/// concurrency story: a save and a refresh can both be enqueued, but
/// their effects on the cache and status line never interleave.
///
/// Consumers observe the orchestrator through three read paths:
/// the status line ([`subscribe_status`](Self::subscribe_status)),
/// change notifications ([`subscribe`](Self::subscribe)) and the
/// filtered record cache ([`records`](Self::records)).
pub struct SyncOrchestrator<A: AuthApi, R: RecordsApi> {
    session: Arc<SessionReconciler<A>>,
    accessor: Arc<RecordAccessor<A, R>>,
    drafts: Arc<DraftStore>,
    cache: Mutex<Vec<LogRecord>>,
    status_tx: watch::Sender<String>,
    notify_tx: broadcast::Sender<SyncNotification>,
    list_limit: usize,
}

/// What an opening editor gets to show.
#[derive(Debug, Clone)]
pub struct EditorContent {
    /// The cached record being edited, if one matched.
    pub record: Option<LogRecord>,
    /// A retained draft for the slot, if one is worth restoring.
    pub draft: Option<DraftFields>,
}

impl<A: AuthApi, R: RecordsApi> SyncOrchestrator<A, R> {
    pub fn new(
        session: Arc<SessionReconciler<A>>,
        accessor: Arc<RecordAccessor<A, R>>,
        drafts: Arc<DraftStore>,
        list_limit: usize,
    ) -> Self {
        let (status_tx, _) = watch::channel(String::new());
        let (notify_tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            session,
            accessor,
            drafts,
            cache: Mutex::new(Vec::new()),
            status_tx,
            notify_tx,
            list_limit,
        }
    }

    /// Consume triggers until the queue closes.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<SyncTrigger>) {
        while let Some(trigger) = triggers.recv().await {
            tracing::debug!(trigger = ?trigger, "handling sync trigger");
            self.handle(trigger).await;
        }
        tracing::debug!("trigger queue closed, orchestrator stopping");
    }

    async fn handle(&self, trigger: SyncTrigger) {
        match trigger {
            SyncTrigger::Refresh => self.refresh().await,
            SyncTrigger::VisibilityResumed => self.visibility_resumed().await,
            SyncTrigger::AuthStateChanged(state) => self.auth_state_changed(state).await,
            SyncTrigger::OpenEditor(id) => {
                let _ = self.open_editor(id.as_deref());
            }
            SyncTrigger::Save(input) => {
                let _ = self.save(input).await;
            }
            SyncTrigger::Delete(id) => {
                let _ = self.delete(&id).await;
            }
        }
    }

    /// Latest status line receiver.
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    /// Change notification receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotification> {
        self.notify_tx.subscribe()
    }

    /// Filtered view of the cached records.
    pub fn records(&self, filter: &RecordFilter) -> Vec<LogRecord> {
        let cache = self.lock_cache();
        filter.apply(&cache)
    }

    /// Content for an opening editor: the cached record (when editing)
    /// plus any retained draft for the slot. A fresh editor resets the
    /// status line.
    pub fn open_editor(&self, id: Option<&str>) -> EditorContent {
        let record = id.and_then(|id| {
            self.lock_cache()
                .iter()
                .find(|r| r.id.as_deref() == Some(id))
                .cloned()
        });
        let user_id = self.session.current_session().map(|s| s.user_id);
        let key = DraftKey::for_parts(user_id.as_deref(), id);
        let draft = self.drafts.restore(&key);
        if id.is_none() {
            self.set_status(status::READY_NEW);
        }
        EditorContent { record, draft }
    }

    /// Create an account.
    pub async fn sign_up(&self, email: &str, password: &str) -> bool {
        self.set_status(status::SIGNING_UP);
        match self.session.sign_up(email, password).await {
            Ok(()) => {
                self.set_status(status::SIGNED_UP);
                true
            }
            Err(e) => {
                self.set_status(&status::err(&e));
                false
            }
        }
    }

    /// Sign in and pull the record list.
    pub async fn sign_in(&self, email: &str, password: &str) -> bool {
        self.set_status(status::SIGNING_IN);
        match self.session.sign_in(email, password).await {
            Ok(_) => {
                self.set_status(status::CONNECTED);
                self.notify(SyncNotification::SessionStateChanged(
                    SessionState::Authenticated,
                ));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.set_status(&status::err(&e));
                false
            }
        }
    }

    /// Sign out and drop local record state.
    pub async fn sign_out(&self) -> bool {
        self.set_status(status::SIGNING_OUT);
        match self.session.sign_out().await {
            Ok(()) => {
                self.lock_cache().clear();
                self.set_status(status::DISCONNECTED);
                self.notify(SyncNotification::SessionStateChanged(SessionState::SignedOut));
                self.notify(SyncNotification::RecordsChanged);
                true
            }
            Err(e) => {
                self.set_status(&status::err(&e));
                false
            }
        }
    }

    /// Fetch the latest records into the cache.
    pub async fn refresh(&self) {
        self.set_status(status::SYNCING);
        match self.accessor.list(self.list_limit).await {
            Ok(records) => {
                let count = records.len();
                *self.lock_cache() = records;
                self.set_status(&status::sync_ok(count));
                self.notify(SyncNotification::RecordsChanged);
            }
            Err(e) => self.report_failure(&e),
        }
    }

    /// Save editor input, then refetch the list.
    ///
    /// The refetch only runs after the save is acknowledged, so the cache
    /// never shows a record the remote doesn't have.
    pub async fn save(&self, input: RecordInput) -> Option<LogRecord> {
        self.set_status(status::SAVING);
        match self.accessor.save(input).await {
            Ok(outcome) => {
                self.set_status(if outcome.created {
                    status::SAVED_NEW
                } else {
                    status::SAVED_UPDATE
                });
                self.refresh().await;
                Some(outcome.record)
            }
            Err(e) => {
                self.set_status(&status::err_input_retained(&e));
                None
            }
        }
    }

    /// Delete a record, then refetch the list.
    ///
    /// The cache entry goes away only after the remote acknowledges.
    pub async fn delete(&self, id: &str) -> bool {
        self.set_status(status::DELETING);
        match self.accessor.delete(id).await {
            Ok(()) => {
                self.lock_cache().retain(|r| r.id.as_deref() != Some(id));
                self.set_status(status::DELETED);
                self.notify(SyncNotification::RecordsChanged);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.report_failure(&e);
                false
            }
        }
    }

    /// Foreground-resume check. Verifies the session and nothing else;
    /// a resume must never force a list fetch.
    async fn visibility_resumed(&self) {
        match self.session.reconcile().await {
            Ok(SessionState::Unstable) => self.set_status(status::SESSION_UNSTABLE),
            Ok(_) => {}
            Err(e) => self.set_status(&status::err(&e)),
        }
    }

    async fn auth_state_changed(&self, state: SessionState) {
        self.notify(SyncNotification::SessionStateChanged(state));
        match state {
            SessionState::SignedOut => {
                self.lock_cache().clear();
                self.notify(SyncNotification::RecordsChanged);
            }
            // A user is present, possibly a different one than before;
            // the cache is refetched unconditionally.
            SessionState::Authenticated => self.refresh().await,
            SessionState::Unstable => self.set_status(status::SESSION_UNSTABLE),
            SessionState::Unknown => {}
        }
    }

    fn report_failure(&self, error: &AccessError) {
        if self.session.state() == SessionState::Unstable {
            self.set_status(status::SESSION_UNSTABLE);
        } else {
            self.set_status(&status::err(error));
        }
    }

    fn set_status(&self, line: &str) {
        let _ = self.status_tx.send(line.to_string());
    }

    fn notify(&self, notification: SyncNotification) {
        // Nobody listening is fine.
        let _ = self.notify_tx.send(notification);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}
