//! Session lifecycle state machine using rust-fsm.
//!
//! The machine makes the lifecycle explicit instead of deriving it from
//! whether tokens happen to be lying around in storage.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │     Unknown     │ (initial)
//! └───┬─────────┬───┘
//!     │         │ NoSession / SignOutConfirmed
//!     │         ▼
//!     │  ┌─────────────┐
//!     │  │  SignedOut  │ ◄──────────────── SignOutConfirmed
//!     │  └──────┬──────┘                          │
//!     │         │ SignedIn                        │
//!     ▼         ▼                                 │
//! ┌─────────────────┐  ReconcileFailed  ┌─────────┴───────┐
//! │  Authenticated  │ ────────────────► │    Unstable     │
//! └─────────────────┘ ◄──────────────── └─────────────────┘
//!                      ReconcileSucceeded
//! ```
//!
//! A failed reconcile never signs the user out. It parks the session in
//! `Unstable`, where the stored tokens are kept and retried; only an
//! explicit sign-out signal reaches `SignedOut` from there.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unknown)

    Unknown => {
        SignedIn => Authenticated,
        ReconcileSucceeded => Authenticated,
        ReconcileFailed => Unstable,
        NoSession => SignedOut,
        SignOutConfirmed => SignedOut
    },
    Authenticated => {
        SignedIn => Authenticated,
        ReconcileSucceeded => Authenticated,
        ReconcileFailed => Unstable,
        SignOutConfirmed => SignedOut
    },
    Unstable => {
        SignedIn => Authenticated,
        ReconcileSucceeded => Authenticated,
        ReconcileFailed => Unstable,
        SignOutConfirmed => SignedOut
    },
    SignedOut => {
        SignedIn => Authenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Startup state before the first reconcile.
    Unknown,
    /// Session verified against the server.
    Authenticated,
    /// Session exists but the last reconcile failed.
    Unstable,
    /// No session.
    SignedOut,
}

impl SessionState {
    /// Returns true if the session was verified by the last reconcile.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true if stored tokens exist and are worth using.
    ///
    /// `Unstable` counts: the tokens may still work, the last check just
    /// didn't get through.
    pub fn has_usable_session(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::Unstable)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unknown => SessionState::Unknown,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Unstable => SessionState::Unstable,
            SessionMachineState::SignedOut => SessionState::SignedOut,
        }
    }
}
