//! Session reconciliation against the remote auth service.

use crate::exclusive::ExclusiveRunner;
use crate::fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::throttle::RefreshThrottle;
use crate::{SessionError, SessionResult};
use draft_durability_store::{StateStorage, StorageKeys};
use journal_supabase_gateway::{AuthApi, ErrorClass, Session};
use std::sync::{Arc, Mutex};

/// Callback invoked whenever the session state changes.
pub type StateChangeCallback = Box<dyn Fn(SessionState) + Send + Sync>;

struct SessionCell {
    machine: SessionMachine,
    session: Option<Session>,
}

/// Reconciles the locally stored session with the auth service.
///
/// All session-mutating entry points run through an [`ExclusiveRunner`],
/// so a reconcile can never race a sign-in or another reconcile. The
/// lifecycle itself lives in the [`SessionMachine`]; this type feeds it
/// inputs and owns the token material around it.
pub struct SessionReconciler<A: AuthApi> {
    auth: Arc<A>,
    storage: Arc<dyn StateStorage>,
    cell: Mutex<SessionCell>,
    runner: ExclusiveRunner,
    throttle: RefreshThrottle,
    callbacks: Mutex<Vec<StateChangeCallback>>,
}

impl<A: AuthApi> SessionReconciler<A> {
    /// Create a reconciler, loading any persisted session.
    ///
    /// The machine starts in `Unknown` even when tokens were loaded; only
    /// a reconcile (or a fresh sign-in) promotes them.
    pub fn new(auth: Arc<A>, storage: Arc<dyn StateStorage>) -> SessionResult<Self> {
        let session = match storage.get(StorageKeys::SESSION)? {
            Some(blob) => match serde_json::from_str::<Session>(&blob) {
                Ok(session) => Some(session),
                Err(e) => {
                    // A corrupt blob is dropped rather than wedging startup.
                    tracing::warn!(error = %e, "discarding unreadable persisted session");
                    storage.delete(StorageKeys::SESSION)?;
                    None
                }
            },
            None => None,
        };
        Ok(Self {
            auth,
            storage,
            cell: Mutex::new(SessionCell {
                machine: SessionMachine::new(),
                session,
            }),
            runner: ExclusiveRunner::new(),
            throttle: RefreshThrottle::default(),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    /// Current session snapshot, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.lock_cell().session.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        SessionState::from(self.lock_cell().machine.state())
    }

    /// Run a future under the same serialization as the session
    /// operations. Must not be re-entered from inside the future.
    pub async fn run_exclusive<F, T>(&self, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        self.runner.run(fut).await
    }

    /// Register a callback for session state changes.
    pub fn on_state_change(&self, callback: StateChangeCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback);
    }

    /// Create an account. Does not sign in; Supabase may require email
    /// confirmation before a password grant succeeds.
    pub async fn sign_up(&self, email: &str, password: &str) -> SessionResult<()> {
        self.runner
            .run(async {
                self.auth.sign_up(email, password).await?;
                tracing::info!(email = %email, "account created");
                Ok(())
            })
            .await
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> SessionResult<Session> {
        self.runner
            .run(async {
                let session = self.auth.sign_in(email, password).await?;
                self.install_session(session.clone())?;
                self.consume(SessionMachineInput::SignedIn);
                tracing::info!(user_id = %session.user_id, "signed in");
                Ok(session)
            })
            .await
    }

    /// Sign out.
    ///
    /// The remote revocation is best effort: the local session is cleared
    /// and the state moves to `SignedOut` even when the revoke call fails,
    /// because the user asked to leave and must not be held hostage by a
    /// flaky network.
    pub async fn sign_out(&self) -> SessionResult<()> {
        self.runner
            .run(async {
                let access_token = self.lock_cell().session.as_ref().map(|s| s.access_token.clone());
                if let Some(token) = access_token {
                    if let Err(e) = self.auth.sign_out(&token).await {
                        tracing::warn!(error = %e, "remote sign-out failed, clearing locally");
                    }
                }
                self.clear_session()?;
                self.consume(SessionMachineInput::SignOutConfirmed);
                tracing::info!("signed out");
                Ok(())
            })
            .await
    }

    /// Verify the stored session against the server, refreshing once if
    /// it looks expired. Runs exclusively.
    ///
    /// Never returns an error for a failed check: a failure is a state
    /// transition (`Unstable`), not an exception. Only storage faults
    /// while persisting a refreshed session surface as errors.
    pub async fn reconcile(&self) -> SessionResult<SessionState> {
        self.runner.run(self.reconcile_inner()).await
    }

    /// The reconcile body, without the exclusive lock. Callers other than
    /// [`reconcile`](Self::reconcile) must already hold the runner.
    async fn reconcile_inner(&self) -> SessionResult<SessionState> {
        let session = match self.current_session() {
            Some(session) => session,
            None => {
                self.consume(SessionMachineInput::NoSession);
                return Ok(self.state());
            }
        };

        if session.is_expired() {
            tracing::debug!("session expired locally, attempting refresh");
            self.try_refresh(&session).await?;
            return Ok(self.state());
        }

        match self.auth.get_user(&session.access_token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session verified");
                self.consume(SessionMachineInput::ReconcileSucceeded);
            }
            Err(e) if e.class() == ErrorClass::AuthExpired => {
                tracing::debug!("access token rejected, attempting refresh");
                self.try_refresh(&session).await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, class = ?e.class(), "session check failed");
                self.consume(SessionMachineInput::ReconcileFailed);
            }
        }
        Ok(self.state())
    }

    /// One throttled refresh attempt. Failure of any kind parks the
    /// session in `Unstable`; the tokens stay for the next attempt.
    async fn try_refresh(&self, session: &Session) -> SessionResult<()> {
        if !self.throttle.try_acquire() {
            tracing::debug!("refresh suppressed by cooldown");
            self.consume(SessionMachineInput::ReconcileFailed);
            return Ok(());
        }

        match self.auth.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                self.install_session(refreshed)?;
                self.consume(SessionMachineInput::ReconcileSucceeded);
                tracing::info!("session refreshed");
            }
            Err(e) => {
                if e.class() == ErrorClass::RateLimited {
                    self.throttle.arm();
                }
                tracing::warn!(error = %e, class = ?e.class(), "refresh failed");
                self.consume(SessionMachineInput::ReconcileFailed);
            }
        }
        Ok(())
    }

    fn install_session(&self, session: Session) -> Result<(), SessionError> {
        let blob = serde_json::to_string(&session)
            .map_err(draft_durability_store::StorageError::Encoding)?;
        self.storage.set(StorageKeys::SESSION, &blob)?;
        self.lock_cell().session = Some(session);
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        self.storage.delete(StorageKeys::SESSION)?;
        self.lock_cell().session = None;
        Ok(())
    }

    /// Feed the machine. Invalid transitions are logged and dropped; the
    /// machine already holds the state those inputs would contradict.
    fn consume(&self, input: SessionMachineInput) {
        let state = {
            let mut cell = self.lock_cell();
            let before = cell.machine.state().clone();
            if cell.machine.consume(&input).is_err() {
                tracing::debug!(state = ?before, input = ?input, "ignoring invalid transition");
                return;
            }
            if *cell.machine.state() == before {
                return;
            }
            SessionState::from(cell.machine.state())
        };
        let callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
        for callback in callbacks.iter() {
            callback(state);
        }
    }

    fn lock_cell(&self) -> std::sync::MutexGuard<'_, SessionCell> {
        self.cell.lock().unwrap_or_else(|e| e.into_inner())
    }
}
