//! Refresh attempt throttling.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between token refresh attempts.
pub const REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// Rate limiter for token refresh.
///
/// Supabase rate-limits the token endpoint aggressively, and a burst of
/// reconciles (tab focus, timer, manual refresh) must collapse to at most
/// one refresh per cooldown window.
pub struct RefreshThrottle {
    cooldown: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl Default for RefreshThrottle {
    fn default() -> Self {
        Self::new(REFRESH_COOLDOWN)
    }
}

impl RefreshThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    /// Try to claim a refresh slot. Returns false while the cooldown from
    /// the previous claim is still running.
    pub fn try_acquire(&self) -> bool {
        let mut last = self.last_attempt.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.cooldown => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Restart the cooldown window from now.
    ///
    /// Used when the server answers 429: the next attempt must wait a full
    /// window from the rejection, not from the original claim.
    pub fn arm(&self) {
        let mut last = self.last_attempt.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(Instant::now());
    }
}
