//! Error types and failure classification for remote operations.
//!
//! The classification drives retry decisions upstream: transient aborts and
//! rate limiting are retried with a bounded budget, auth expiry is surfaced
//! as a sign-in prompt, and remote rejections are terminal immediately.

use thiserror::Error;

/// Error type for all Supabase gateway operations.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and requests cancelled by the
    /// runtime (e.g., the host backgrounding the process mid-call).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase returned a non-success HTTP status.
    ///
    /// Contains the status code and response body. Common causes: expired
    /// JWT, rate limiting, RLS policy violation, payload validation.
    #[error("Supabase error: {status} - {message}")]
    Supabase {
        /// The HTTP status code returned by Supabase.
        status: u16,
        /// The response body, typically containing error details.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration or initialization error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for gateway operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure classification used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No valid session obtainable; caller must sign in again.
    AuthExpired,
    /// Request cancelled or dropped by the runtime/network, not refused by
    /// the server. Safe to retry after a short sleep.
    TransientAbort,
    /// Server signalled throttling (429). Retry only after a cooldown.
    RateLimited,
    /// The server received the request and refused it for a non-auth reason
    /// (validation, missing row). Never retried.
    RemoteRejected,
    /// Anything else, including server-side 5xx.
    Unknown,
}

impl ErrorClass {
    /// Whether the accessor's bounded retry loop should attempt this again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::TransientAbort | ErrorClass::RateLimited)
    }
}

impl RemoteError {
    /// Classify this error for retry/surface decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            RemoteError::Http(e) => {
                if e.is_decode() {
                    // The server answered, we just couldn't make sense of it.
                    ErrorClass::RemoteRejected
                } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
                    ErrorClass::TransientAbort
                } else {
                    ErrorClass::Unknown
                }
            }
            RemoteError::Supabase { status, .. } => match status {
                401 => ErrorClass::AuthExpired,
                429 => ErrorClass::RateLimited,
                400..=499 => ErrorClass::RemoteRejected,
                _ => ErrorClass::Unknown,
            },
            RemoteError::Json(_) => ErrorClass::RemoteRejected,
            RemoteError::Config(_) => ErrorClass::Unknown,
        }
    }
}
