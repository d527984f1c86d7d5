//! Error type for session operations.

use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Remote call failed
    #[error("Remote error: {0}")]
    Remote(#[from] journal_supabase_gateway::RemoteError),

    /// Persisting or loading the session failed
    #[error("Storage error: {0}")]
    Storage(#[from] draft_durability_store::StorageError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
