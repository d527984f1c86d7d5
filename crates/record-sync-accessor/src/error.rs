//! Error type for record access.

use journal_supabase_gateway::{ErrorClass, RemoteError};
use thiserror::Error;

/// Error type for record operations.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No usable session; the caller must sign in first
    #[error("Sign in required")]
    AuthRequired,

    /// Remote call failed after any applicable retries
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Session bookkeeping failed
    #[error("Session error: {0}")]
    Session(#[from] session_reconciler::SessionError),

    /// Local draft persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] draft_durability_store::StorageError),
}

impl AccessError {
    /// Failure classification of the underlying remote error, if any.
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            AccessError::Remote(e) => Some(e.class()),
            _ => None,
        }
    }
}

/// Result type for record operations.
pub type AccessResult<T> = Result<T, AccessError>;
