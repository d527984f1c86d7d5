//! Wiring for the client stack.

use anyhow::Result;
use draft_durability_store::{DraftStore, FileStateStorage, StateStorage};
use journal_config_and_utils::{Config, Paths, DEFAULT_LIST_LIMIT};
use journal_supabase_gateway::SupabaseClient;
use record_sync_accessor::{RecordAccessor, RetryPolicy};
use session_reconciler::SessionReconciler;
use std::sync::Arc;
use sync_orchestrator::SyncOrchestrator;

/// The assembled client stack.
pub struct App {
    pub session: Arc<SessionReconciler<SupabaseClient>>,
    pub orchestrator: Arc<SyncOrchestrator<SupabaseClient, SupabaseClient>>,
}

/// Build the full stack from configuration.
///
/// One [`SupabaseClient`] serves as both the auth and the records
/// gateway; one file-backed storage holds the session and the drafts.
pub fn build(config: &Config, paths: &Paths) -> Result<App> {
    paths.ensure_dirs()?;
    let storage: Arc<dyn StateStorage> = Arc::new(FileStateStorage::new(paths.state_dir())?);
    let client = Arc::new(SupabaseClient::new(
        &config.supabase_url,
        &config.supabase_publishable_key,
    ));
    let session = Arc::new(SessionReconciler::new(
        Arc::clone(&client),
        Arc::clone(&storage),
    )?);
    let drafts = Arc::new(DraftStore::new(storage)?);
    let accessor = Arc::new(RecordAccessor::new(
        Arc::clone(&session),
        client,
        Arc::clone(&drafts),
        RetryPolicy::default(),
    ));
    let orchestrator = Arc::new(SyncOrchestrator::new(
        Arc::clone(&session),
        accessor,
        drafts,
        DEFAULT_LIST_LIMIT,
    ));
    Ok(App {
        session,
        orchestrator,
    })
}
