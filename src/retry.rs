use std::time::Duration;

/// Upper bound on any single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Statuses retried with backoff: rate limiting and the server errors that
/// tend to clear on their own. Everything else fails fast.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Bounded retry with exponential backoff for vendor lookups.
///
/// The wait after a failed attempt doubles from `base_delay` per attempt and
/// never exceeds [`MAX_BACKOFF`]. Three attempts unless the caller
/// configures otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// True when another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff to wait after the given 1-based attempt fails.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let scaled = self.base_delay.as_secs_f64() * f64::from(2u32.pow(exponent));
        Duration::from_secs_f64(scaled.min(MAX_BACKOFF.as_secs_f64()))
    }
}

/// Minimum pause after each processed row for the given per-vendor budget.
/// A budget of zero calls per minute disables pacing.
pub fn per_call_delay(calls_per_minute: u32) -> Duration {
    if calls_per_minute == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(60.0 / f64::from(calls_per_minute))
    }
}
