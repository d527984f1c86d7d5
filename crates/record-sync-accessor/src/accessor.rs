//! Retrying access to remote journal records.

use crate::{AccessError, AccessResult, RetryPolicy};
use draft_durability_store::{DraftFields, DraftKey, DraftStore};
use journal_supabase_gateway::{
    map_hidden_kind, AuthApi, ErrorClass, LogRecord, RecordPayload, RecordsApi, Session,
};
use session_reconciler::{SessionReconciler, SessionState};
use std::future::Future;
use std::sync::Arc;

/// Editor input for a save.
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    /// Remote id when editing an existing record, `None` for a new one.
    pub id: Option<String>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub mood: Option<i64>,
}

impl RecordInput {
    fn draft_fields(&self) -> DraftFields {
        DraftFields {
            kind: self.kind.clone(),
            title: self.title.clone(),
            tags: self.tags.join(", "),
            mood: self.mood.map(|m| m.to_string()).unwrap_or_default(),
            body: self.body.clone(),
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub record: LogRecord,
    /// True when the save created a new record rather than updating one.
    pub created: bool,
}

/// Remote record operations with session reconciliation and retries.
///
/// Every operation first makes sure a usable session exists, then runs
/// the remote call with a bounded retry loop. A 401 mid-operation gets
/// one reconcile (which may refresh the token) and one re-run with the
/// fresh token; transient aborts and rate limits get up to
/// `max_attempts` tries with a fixed pause between them. Everything else
/// fails immediately.
///
/// [`save`](RecordAccessor::save) additionally guarantees draft
/// durability: the input is written to the draft store before the remote
/// call, and cleared only after the remote acknowledges. On any `Err`
/// the draft is still there.
pub struct RecordAccessor<A: AuthApi, R: RecordsApi> {
    session: Arc<SessionReconciler<A>>,
    records: Arc<R>,
    drafts: Arc<DraftStore>,
    policy: RetryPolicy,
}

impl<A: AuthApi, R: RecordsApi> RecordAccessor<A, R> {
    pub fn new(
        session: Arc<SessionReconciler<A>>,
        records: Arc<R>,
        drafts: Arc<DraftStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            session,
            records,
            drafts,
            policy,
        }
    }

    /// Fetch the most recent records, newest first.
    pub async fn list(&self, limit: usize) -> AccessResult<Vec<LogRecord>> {
        let records = Arc::clone(&self.records);
        self.with_retries(move |session| {
            let records = Arc::clone(&records);
            async move { records.list_records(&session.access_token, limit).await }
        })
        .await
    }

    /// Save a record, creating or updating depending on `input.id`.
    ///
    /// The input is persisted as a draft before the remote call and the
    /// draft is cleared only on success, so a failed save never loses
    /// what the user typed.
    pub async fn save(&self, input: RecordInput) -> AccessResult<SaveOutcome> {
        let user_id = self.session.current_session().map(|s| s.user_id);
        let draft_key = DraftKey::for_parts(user_id.as_deref(), input.id.as_deref());
        self.drafts.save_now(&draft_key, input.draft_fields())?;

        let (kind, tags) = map_hidden_kind(&input.kind, &input.tags);
        let created = input.id.is_none();
        let records = Arc::clone(&self.records);
        let id = input.id.clone();
        let title = input.title.clone();
        let body = input.body.clone();
        let mood = input.mood;

        let record = self
            .with_retries(move |session| {
                let records = Arc::clone(&records);
                let payload = RecordPayload {
                    kind: kind.clone(),
                    title: title.clone(),
                    body: body.clone(),
                    tags: tags.clone(),
                    mood,
                    user_id: session.user_id.clone(),
                };
                let id = id.clone();
                async move {
                    match id {
                        Some(id) => {
                            records
                                .update_record(&session.access_token, &id, &payload)
                                .await
                        }
                        None => records.insert_record(&session.access_token, &payload).await,
                    }
                }
            })
            .await?;

        self.drafts.clear(&draft_key)?;
        tracing::info!(id = ?record.id, created, "record saved");
        Ok(SaveOutcome { record, created })
    }

    /// Delete a record. The matching draft, if any, goes with it.
    pub async fn delete(&self, id: &str) -> AccessResult<()> {
        let records = Arc::clone(&self.records);
        let record_id = id.to_string();
        self.with_retries(move |session| {
            let records = Arc::clone(&records);
            let record_id = record_id.clone();
            async move { records.delete_record(&session.access_token, &record_id).await }
        })
        .await?;

        let user_id = self.session.current_session().map(|s| s.user_id);
        let draft_key = DraftKey::for_parts(user_id.as_deref(), Some(id));
        self.drafts.clear(&draft_key)?;
        tracing::info!(id = %id, "record deleted");
        Ok(())
    }

    async fn ensure_session(&self) -> AccessResult<Session> {
        // A cached Authenticated verdict is only trusted while the token
        // is still valid by the local clock. Unstable, Unknown and an
        // expired token all get a fresh reconcile first.
        let trusted = self.session.state() == SessionState::Authenticated
            && self
                .session
                .current_session()
                .is_some_and(|s| !s.is_expired());
        if !trusted {
            let state = self.session.reconcile().await?;
            if !state.has_usable_session() {
                return Err(AccessError::AuthRequired);
            }
        }
        self.session
            .current_session()
            .ok_or(AccessError::AuthRequired)
    }

    /// Run `op` against the remote, handling classified failures.
    async fn with_retries<T, F, Fut>(&self, op: F) -> AccessResult<T>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = journal_supabase_gateway::RemoteResult<T>>,
    {
        let mut session = self.ensure_session().await?;
        let mut reconciled = false;
        let mut attempt: u32 = 1;
        loop {
            let error = match op(session.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            match error.class() {
                ErrorClass::AuthExpired if !reconciled => {
                    reconciled = true;
                    tracing::debug!("access token rejected mid-operation, reconciling");
                    let state = self.session.reconcile().await?;
                    if !state.has_usable_session() {
                        return Err(AccessError::AuthRequired);
                    }
                    session = self
                        .session
                        .current_session()
                        .ok_or(AccessError::AuthRequired)?;
                }
                class @ (ErrorClass::TransientAbort | ErrorClass::RateLimited)
                    if attempt < self.policy.max_attempts =>
                {
                    tracing::debug!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        class = ?class,
                        error = %error,
                        "retrying remote operation"
                    );
                    attempt += 1;
                    let pause = if class == ErrorClass::RateLimited {
                        self.policy.rate_limit_sleep
                    } else {
                        self.policy.retry_sleep
                    };
                    tokio::time::sleep(pause).await;
                }
                class => {
                    tracing::warn!(class = ?class, error = %error, "remote operation failed");
                    return Err(AccessError::Remote(error));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draft_durability_store::MemoryStateStorage;
    use journal_supabase_gateway::{AuthUser, RemoteError, RemoteResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ========================================================================
    // Fakes
    // ========================================================================

    #[derive(Default)]
    struct FakeAuth {
        issue_expired: AtomicBool,
        get_user_failures: Mutex<Vec<RemoteError>>,
        get_user_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
    }

    impl FakeAuth {
        /// When on, issued sessions are already past their expiry.
        fn issue_expired_sessions(&self, on: bool) {
            self.issue_expired.store(on, Ordering::SeqCst);
        }

        fn fail_next_get_user(&self, error: RemoteError) {
            self.get_user_failures.lock().unwrap().push(error);
        }

        fn session(&self, email: &str) -> Session {
            let ttl = if self.issue_expired.load(Ordering::SeqCst) {
                -chrono::Duration::hours(1)
            } else {
                chrono::Duration::hours(1)
            };
            Session {
                user_id: "u-1".to_string(),
                email: Some(email.to_string()),
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: chrono::Utc::now() + ttl,
            }
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn sign_up(&self, _email: &str, _password: &str) -> RemoteResult<()> {
            Ok(())
        }

        async fn sign_in(&self, email: &str, _password: &str) -> RemoteResult<Session> {
            Ok(self.session(email))
        }

        async fn sign_out(&self, _access_token: &str) -> RemoteResult<()> {
            Ok(())
        }

        async fn get_user(&self, _access_token: &str) -> RemoteResult<AuthUser> {
            self.get_user_calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.get_user_failures.lock().unwrap();
            if failures.is_empty() {
                Ok(AuthUser {
                    id: "u-1".to_string(),
                    email: Some("lain@wired.net".to_string()),
                })
            } else {
                Err(failures.remove(0))
            }
        }

        async fn refresh(&self, _refresh_token: &str) -> RemoteResult<Session> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.session("lain@wired.net"))
        }
    }

    /// In-memory records backend. Failures can be queued per call.
    #[derive(Default)]
    struct FakeRecords {
        rows: Mutex<HashMap<String, LogRecord>>,
        failures: Mutex<Vec<RemoteError>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeRecords {
        fn fail_next(&self, error: RemoteError) {
            self.failures.lock().unwrap().push(error);
        }

        fn take_failure(&self) -> Option<RemoteError> {
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        }
    }

    #[async_trait]
    impl RecordsApi for FakeRecords {
        async fn list_records(
            &self,
            _access_token: &str,
            limit: usize,
        ) -> RemoteResult<Vec<LogRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            let rows = self.rows.lock().unwrap();
            let mut records: Vec<LogRecord> = rows.values().cloned().collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            records.truncate(limit);
            Ok(records)
        }

        async fn insert_record(
            &self,
            _access_token: &str,
            payload: &RecordPayload,
        ) -> RemoteResult<LogRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            let id = format!("r-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let record = LogRecord {
                id: Some(id.clone()),
                kind: payload.kind.clone(),
                title: payload.title.clone(),
                body: payload.body.clone(),
                tags: payload.tags.clone(),
                mood: payload.mood,
                user_id: payload.user_id.clone(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            self.rows.lock().unwrap().insert(id, record.clone());
            Ok(record)
        }

        async fn update_record(
            &self,
            _access_token: &str,
            id: &str,
            payload: &RecordPayload,
        ) -> RemoteResult<LogRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            let mut rows = self.rows.lock().unwrap();
            let record = rows.get_mut(id).ok_or(RemoteError::Supabase {
                status: 404,
                message: "no such record".to_string(),
            })?;
            record.kind = payload.kind.clone();
            record.title = payload.title.clone();
            record.body = payload.body.clone();
            record.tags = payload.tags.clone();
            record.mood = payload.mood;
            record.updated_at = chrono::Utc::now();
            Ok(record.clone())
        }

        async fn delete_record(&self, _access_token: &str, id: &str) -> RemoteResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            self.rows.lock().unwrap().remove(id);
            Ok(())
        }
    }

    struct Harness {
        accessor: RecordAccessor<FakeAuth, FakeRecords>,
        auth: Arc<FakeAuth>,
        records: Arc<FakeRecords>,
        drafts: Arc<DraftStore>,
        session: Arc<SessionReconciler<FakeAuth>>,
    }

    async fn signed_in_harness() -> Harness {
        let storage: Arc<dyn draft_durability_store::StateStorage> =
            Arc::new(MemoryStateStorage::new());
        let auth = Arc::new(FakeAuth::default());
        let session =
            Arc::new(SessionReconciler::new(Arc::clone(&auth), Arc::clone(&storage)).unwrap());
        session.sign_in("lain@wired.net", "pw").await.unwrap();
        let records = Arc::new(FakeRecords::default());
        let drafts = Arc::new(DraftStore::new(storage).unwrap());
        let accessor = RecordAccessor::new(
            Arc::clone(&session),
            Arc::clone(&records),
            Arc::clone(&drafts),
            RetryPolicy::default(),
        );
        Harness {
            accessor,
            auth,
            records,
            drafts,
            session,
        }
    }

    fn input(body: &str) -> RecordInput {
        RecordInput {
            id: None,
            kind: "Note".to_string(),
            title: "present day".to_string(),
            body: body.to_string(),
            tags: vec!["wired".to_string()],
            mood: Some(7),
        }
    }

    fn transient() -> RemoteError {
        RemoteError::Supabase {
            status: 429,
            message: "slow down".to_string(),
        }
    }

    // ========================================================================
    // Round trip
    // ========================================================================

    #[tokio::test]
    async fn insert_list_update_delete_round_trip() {
        let h = signed_in_harness().await;

        let saved = h.accessor.save(input("hello wired")).await.unwrap();
        assert!(saved.created);
        let id = saved.record.id.clone().unwrap();

        let listed = h.accessor.list(200).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].body, "hello wired");

        let updated = h
            .accessor
            .save(RecordInput {
                id: Some(id.clone()),
                body: "edited".to_string(),
                ..input("ignored")
            })
            .await
            .unwrap();
        assert!(!updated.created);
        assert_eq!(updated.record.body, "edited");

        h.accessor.delete(&id).await.unwrap();
        assert!(h.accessor.list(200).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_stamps_user_id_from_session() {
        let h = signed_in_harness().await;
        let saved = h.accessor.save(input("stamped")).await.unwrap();
        assert_eq!(saved.record.user_id, "u-1");
    }

    #[tokio::test]
    async fn save_maps_hidden_kind() {
        let h = signed_in_harness().await;
        let saved = h
            .accessor
            .save(RecordInput {
                kind: "Hidden".to_string(),
                ..input("secret")
            })
            .await
            .unwrap();
        assert_eq!(saved.record.kind, "Other");
        assert_eq!(saved.record.tags.first().map(String::as_str), Some("hidden"));
    }

    // ========================================================================
    // Retries
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_to_success() {
        let h = signed_in_harness().await;
        h.records.fail_next(transient());
        h.records.fail_next(transient());

        let listed = h.accessor.list(200).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(h.records.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_is_bounded() {
        let h = signed_in_harness().await;
        for _ in 0..5 {
            h.records.fail_next(transient());
        }

        let err = h.accessor.list(200).await.unwrap_err();
        assert_eq!(err.class(), Some(ErrorClass::RateLimited));
        assert_eq!(h.records.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let h = signed_in_harness().await;
        h.records.fail_next(RemoteError::Supabase {
            status: 422,
            message: "bad payload".to_string(),
        });

        let err = h.accessor.save(input("rejected")).await.unwrap_err();
        assert_eq!(err.class(), Some(ErrorClass::RemoteRejected));
        assert_eq!(h.records.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_gets_one_reconcile_and_retry() {
        let h = signed_in_harness().await;
        h.records.fail_next(RemoteError::Supabase {
            status: 401,
            message: "jwt expired".to_string(),
        });

        let listed = h.accessor.list(200).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(h.records.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn signed_out_fails_fast_without_remote_calls() {
        let h = signed_in_harness().await;
        h.session.sign_out().await.unwrap();

        let err = h.accessor.list(200).await.unwrap_err();
        assert!(matches!(err, AccessError::AuthRequired));
        assert_eq!(h.records.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_cached_session_reconciles_before_the_call() {
        let h = signed_in_harness().await;
        // Cache a token that is already past its expiry.
        h.auth.issue_expired_sessions(true);
        h.session.sign_in("lain@wired.net", "pw").await.unwrap();
        h.auth.issue_expired_sessions(false);

        let listed = h.accessor.list(200).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(h.auth.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unstable_session_is_rechecked_before_the_call() {
        let h = signed_in_harness().await;
        h.auth.fail_next_get_user(transient());
        h.session.reconcile().await.unwrap();
        assert_eq!(h.session.state(), SessionState::Unstable);
        let checks_before = h.auth.get_user_calls.load(Ordering::SeqCst);

        h.accessor.list(200).await.unwrap();
        assert_eq!(
            h.auth.get_user_calls.load(Ordering::SeqCst),
            checks_before + 1
        );
        assert_eq!(h.session.state(), SessionState::Authenticated);
    }

    // ========================================================================
    // Draft durability
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn failed_save_retains_the_draft() {
        let h = signed_in_harness().await;
        for _ in 0..3 {
            h.records.fail_next(transient());
        }

        let err = h.accessor.save(input("do not lose me")).await.unwrap_err();
        assert!(matches!(err, AccessError::Remote(_)));

        let key = DraftKey::for_parts(Some("u-1"), None);
        let draft = h.drafts.restore(&key).unwrap();
        assert_eq!(draft.body, "do not lose me");
        assert_eq!(draft.tags, "wired");
    }

    #[tokio::test]
    async fn successful_save_clears_the_draft() {
        let h = signed_in_harness().await;

        h.accessor.save(input("sent and done")).await.unwrap();

        let key = DraftKey::for_parts(Some("u-1"), None);
        assert!(h.drafts.restore(&key).is_none());
    }

    #[tokio::test]
    async fn delete_clears_the_matching_draft() {
        let h = signed_in_harness().await;
        let saved = h.accessor.save(input("short lived")).await.unwrap();
        let id = saved.record.id.unwrap();

        // An edit draft accumulates, then the record is deleted.
        let key = DraftKey::for_parts(Some("u-1"), Some(&id));
        h.drafts
            .save_now(
                &key,
                DraftFields {
                    body: "half an edit".to_string(),
                    ..DraftFields::default()
                },
            )
            .unwrap();

        h.accessor.delete(&id).await.unwrap();
        assert!(h.drafts.restore(&key).is_none());
    }
}
