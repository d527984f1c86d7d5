//! Session and record types shared across the client.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The pseudo-kind shown for installed-mode entries. Never stored remotely;
/// persisted as kind "Other" plus the [`HIDDEN_TAG`] tag.
pub const HIDDEN_KIND: &str = "Hidden";

/// Marker tag identifying a hidden entry.
pub const HIDDEN_TAG: &str = "hidden";

/// An authenticated session.
///
/// The access token is opaque to the client; it is only checked for presence
/// and forwarded as a bearer token. The session is persisted locally as a
/// JSON blob so a restarted client can resume without a fresh sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// The user's UUID, used to scope records and draft keys.
    pub user_id: String,
    /// The user's email, for display only.
    pub email: Option<String>,
    /// JWT bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain a new session when the access token expires.
    pub refresh_token: String,
    /// When the access token stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the access token has expired according to the local clock.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// User identity returned by session verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token grant response from the auth endpoints (sign-in and refresh share
/// the same shape).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: TokenUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_session(self) -> Session {
        Session {
            user_id: self.user.id,
            email: self.user.email,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

/// A stored journal record, as returned by the `logs` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    /// Server-assigned identifier. None for a not-yet-created record.
    pub id: Option<String>,
    /// Category tag ("Note", "Counselling", "Other").
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional mood value attached by the user.
    #[serde(default)]
    pub mood: Option<i64>,
    /// Owning user. Set by the core at write time, never from caller input.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of a record, sent on insert and update.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordPayload {
    pub kind: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub mood: Option<i64>,
    pub user_id: String,
}

/// Map the presentation-only "Hidden" kind onto its stored representation:
/// kind "Other" with the hidden tag prepended (no duplicates).
pub fn map_hidden_kind(kind: &str, tags: &[String]) -> (String, Vec<String>) {
    if kind == HIDDEN_KIND {
        let mut mapped = tags.to_vec();
        if !mapped.iter().any(|t| t == HIDDEN_TAG) {
            mapped.insert(0, HIDDEN_TAG.to_string());
        }
        ("Other".to_string(), mapped)
    } else {
        (kind.to_string(), tags.to_vec())
    }
}

/// The reverse of [`map_hidden_kind`]: a stored "Other" record carrying the
/// hidden tag is presented as "Hidden" with the marker tag stripped.
pub fn unmap_hidden_kind(kind: &str, tags: &[String]) -> (String, Vec<String>) {
    if kind == "Other" && tags.iter().any(|t| t == HIDDEN_TAG) {
        let stripped = tags.iter().filter(|t| *t != HIDDEN_TAG).cloned().collect();
        (HIDDEN_KIND.to_string(), stripped)
    } else {
        (kind.to_string(), tags.to_vec())
    }
}
