//! Status line vocabulary.
//!
//! The client surfaces one terse status line at a time. The wording is
//! part of the product, not debug output, so it lives here as constants
//! rather than ad hoc format strings.

pub const SIGNING_UP: &str = "SIGNUP…";
pub const SIGNING_IN: &str = "LOGIN…";
pub const SIGNING_OUT: &str = "LOGOUT…";
pub const SYNCING: &str = "SYNC…";
pub const SAVING: &str = "SAVE…";
pub const DELETING: &str = "DELETE…";

pub const SIGNED_UP: &str = "SIGNED UP. CHECK EMAIL IF REQUIRED.";
pub const CONNECTED: &str = "CONNECTED.";
pub const DISCONNECTED: &str = "DISCONNECTED.";
pub const SAVED_NEW: &str = "SAVED (NEW).";
pub const SAVED_UPDATE: &str = "SAVED (UPDATE).";
pub const DELETED: &str = "DELETED.";
pub const READY_NEW: &str = "READY // NEW LOG";

pub const SESSION_UNSTABLE: &str = "SESSION UNSTABLE // RETRYING";

pub fn sync_ok(count: usize) -> String {
    format!("SYNC OK // {count} logs")
}

pub fn err(message: impl std::fmt::Display) -> String {
    format!("ERR: {message}")
}

/// Save failures additionally tell the user their input survived.
pub fn err_input_retained(message: impl std::fmt::Display) -> String {
    format!("ERR: {message} // INPUT RETAINED LOCALLY")
}
