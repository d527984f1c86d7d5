//! Supabase gateway for the Wired Journal client.
//!
//! Wraps the two remote surfaces the client depends on:
//!
//! - **Auth** (`/auth/v1/*`): sign-up, password sign-in, sign-out, session
//!   verification, and token refresh.
//! - **Records** (`/rest/v1/logs`): the user's journal entries, scoped to the
//!   caller's session by row-level security.
//!
//! Every failure is classified into an [`ErrorClass`] so upstream layers can
//! decide between retrying, backing off, or surfacing a terminal error. The
//! [`AuthApi`] and [`RecordsApi`] traits are the seams test code uses to
//! substitute scripted fakes for the real [`SupabaseClient`].

mod client;
mod error;
mod types;

pub use client::SupabaseClient;
pub use error::{ErrorClass, RemoteError, RemoteResult};
pub use types::{
    map_hidden_kind, unmap_hidden_kind, AuthUser, LogRecord, RecordPayload, Session, HIDDEN_KIND,
    HIDDEN_TAG,
};

use async_trait::async_trait;

/// Remote authentication operations.
///
/// Implemented by [`SupabaseClient`] against the GoTrue endpoints; tests
/// provide scripted fakes.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Register a new user. Supabase may require email confirmation before
    /// the account becomes usable, so no session is returned here.
    async fn sign_up(&self, email: &str, password: &str) -> RemoteResult<()>;

    /// Exchange email/password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<Session>;

    /// Revoke the session server-side.
    async fn sign_out(&self, access_token: &str) -> RemoteResult<()>;

    /// Verify an access token and return the user it belongs to.
    async fn get_user(&self, access_token: &str) -> RemoteResult<AuthUser>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> RemoteResult<Session>;
}

/// Remote record operations on the `logs` collection.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// List records, newest first, bounded by `limit`.
    async fn list_records(&self, access_token: &str, limit: usize) -> RemoteResult<Vec<LogRecord>>;

    /// Insert a record; the server assigns the id and timestamps.
    async fn insert_record(
        &self,
        access_token: &str,
        payload: &RecordPayload,
    ) -> RemoteResult<LogRecord>;

    /// Update the record with the given id, returning the stored row.
    async fn update_record(
        &self,
        access_token: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> RemoteResult<LogRecord>;

    /// Delete the record with the given id.
    async fn delete_record(&self, access_token: &str, id: &str) -> RemoteResult<()>;
}
