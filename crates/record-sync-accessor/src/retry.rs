//! Retry configuration for remote record operations.

use tokio::time::Duration;

/// Retry behavior for classified remote failures.
///
/// Only transient aborts and rate limits are retried; a rejection is a
/// rejection no matter how many times it is resent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per operation, including the first.
    pub max_attempts: u32,
    /// Pause after a transient abort.
    pub retry_sleep: Duration,
    /// Longer pause after a 429; the server asked us to back off.
    pub rate_limit_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_sleep: Duration::from_millis(500),
            rate_limit_sleep: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_sleep, Duration::from_millis(500));
        assert_eq!(policy.rate_limit_sleep, Duration::from_secs(2));
    }
}
