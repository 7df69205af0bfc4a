//! Retry budgets for outbound queue writes.

/// Bounded exponential-backoff budget for [`crate::send_with_retry`].
///
/// Delay for the `n`-th retry (1-indexed) is
/// `min(initial_delay_ms * multiplier^(n-1), max_delay_ms)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor applied to the delay after each retry.
    pub multiplier: f64,
    /// Upper bound on the delay between retries, in milliseconds.
    pub max_delay_ms: u64,
    /// Total attempts including the first, before giving up.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// General-purpose outbound traffic: five attempts, ~500ms-15s backoff.
    #[must_use]
    pub const fn default_policy() -> Self {
        Self { initial_delay_ms: 500, multiplier: 1.8, max_delay_ms: 15_000, max_attempts: 5 }
    }

    /// Latency-sensitive or must-deliver traffic: ten attempts, tighter backoff.
    #[must_use]
    pub const fn critical() -> Self {
        Self { initial_delay_ms: 100, multiplier: 1.5, max_delay_ms: 5_000, max_attempts: 10 }
    }

    /// Collapses to a single attempt; never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self { initial_delay_ms: 0, multiplier: 1.0, max_delay_ms: 0, max_attempts: 1 }
    }

    /// The backoff delay before the `attempt`-th retry (1-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, attempt: u32) -> std::time::Duration {
        let scaled = (self.initial_delay_ms as f64) * self.multiplier.powi((attempt - 1) as i32);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);
        std::time::Duration::from_millis(capped as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_documented_numbers() {
        let default = RetryPolicy::default_policy();
        assert_eq!(default.initial_delay_ms, 500);
        assert!((default.multiplier - 1.8).abs() < f64::EPSILON);
        assert_eq!(default.max_delay_ms, 15_000);
        assert_eq!(default.max_attempts, 5);

        let critical = RetryPolicy::critical();
        assert_eq!(critical.initial_delay_ms, 100);
        assert!((critical.multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(critical.max_delay_ms, 5_000);
        assert_eq!(critical.max_attempts, 10);

        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }

    #[test]
    fn delay_grows_then_saturates_at_max_delay() {
        let policy = RetryPolicy::default_policy();
        assert_eq!(policy.delay_for_retry(1).as_millis(), 500);
        assert_eq!(policy.delay_for_retry(2).as_millis(), 900);
        assert_eq!(policy.delay_for_retry(20).as_millis(), 15_000);
    }
}
