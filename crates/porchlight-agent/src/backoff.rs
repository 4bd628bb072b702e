//! Reconnection backoff policy.
//!
//! The policy is a pure function of the attempt counter so it can be
//! tested without timers; the agent's subscription loop feeds it the
//! current attempt number and sleeps for the returned delay.

use std::time::Duration;

/// Default delay before the first reconnection attempt.
const DEFAULT_BASE: Duration = Duration::from_millis(1000);

/// Default upper bound on the reconnection delay.
const DEFAULT_CAP: Duration = Duration::from_millis(30_000);

/// Exponential backoff policy for reconnection attempts.
///
/// The delay for attempt `n` (1-based) is `base * 2^(n-1)`, bounded by
/// `cap`. This recovers quickly from brief outages while bounding
/// reconnection storms during longer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
}

impl ReconnectPolicy {
    /// Create a policy with an explicit base delay and cap.
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Delay before the given reconnection attempt (1-based).
    ///
    /// Attempt 0 is treated as attempt 1. The delay never exceeds the
    /// cap, regardless of how large the attempt counter grows.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1_u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.cap)
            .min(self.cap)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_CAP)
    }
}
