//! Storage key constants.

/// Well-known storage keys used by the client.
pub struct StorageKeys;

impl StorageKeys {
    /// All drafts, serialized as a single JSON blob.
    pub const DRAFTS: &'static str = "wired_drafts_v1";

    /// The persisted session (tokens and user metadata).
    pub const SESSION: &'static str = "wired_session_v1";
}
