/*!
 * Retry policy with capped exponential backoff.
 *
 * The delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, plus an
 * optional random jitter, capped at `max_delay`.
 */

use std::time::Duration;

use rand::Rng;

/// How often and how long to wait before retrying a failed batch
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap for any single delay
    pub max_delay: Duration,
    /// Upper bound of the random extra delay, zero disables jitter
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts allowed for one batch
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic delay before retry `retry` (1-based), without jitter
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let delay = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(Duration::MAX);
        delay.min(self.max_delay)
    }

    /// Delay before retry `retry` including random jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        if self.jitter.is_zero() {
            return self.delay_for_retry(retry);
        }
        let exponent = retry.saturating_sub(1).min(31);
        let base = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(Duration::MAX);
        let extra = Duration::from_secs_f64(rand::rng().random_range(0.0..self.jitter.as_secs_f64()));
        base.saturating_add(extra).min(self.max_delay)
    }
}
