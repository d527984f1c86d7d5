//! Session lifecycle management for the Wired Journal client.
//!
//! The reconciler owns the stored Supabase session and keeps an explicit
//! state machine over it: `Unknown` at startup, `Authenticated` once the
//! server has vouched for the tokens, `Unstable` when a check fails but
//! the tokens are still worth keeping, and `SignedOut` only when the user
//! says so or no session exists at all.
//!
//! The important property is tolerance: a dropped connection or a 500
//! from the auth endpoint must never throw the user's session away.

mod error;
mod exclusive;
mod fsm;
mod reconciler;
mod throttle;

pub use error::{SessionError, SessionResult};
pub use exclusive::ExclusiveRunner;
pub use fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use reconciler::{SessionReconciler, StateChangeCallback};
pub use throttle::{RefreshThrottle, REFRESH_COOLDOWN};
