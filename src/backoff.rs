//! Deterministic backoff schedule.
//!
//! The delay before attempt `n + 1` is
//! `initial_delay × backoff_multiplier^(n - 1)` for the 1-based attempt `n`
//! that just failed; there is never a delay before attempt 1. The schedule is
//! a pure function of `(attempt, policy)`, which keeps it unit-testable
//! without real time. Randomization lives in [`crate::jitter`] and is applied
//! by the executor after this computation, never baked in here.
//!
//! Overflow behavior: computations that would overflow or lose finiteness
//! saturate to [`MAX_BACKOFF`] (1 day). A configured `max_delay` cap is
//! applied after saturation.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use redial::{BackoffSchedule, ExponentialBackoff, RetryPolicy};
//!
//! let policy = RetryPolicy::default(); // 1s initial, multiplier 2.0
//! let backoff = ExponentialBackoff;
//! assert_eq!(backoff.delay_for(1, &policy), Duration::from_secs(1));
//! assert_eq!(backoff.delay_for(2, &policy), Duration::from_secs(2));
//! assert_eq!(backoff.delay_for(3, &policy), Duration::from_secs(4));
//! ```

use std::fmt;
use std::time::Duration;

use crate::policy::RetryPolicy;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Computes the delay to apply after a failed attempt.
///
/// Implementations must be deterministic given identical inputs.
pub trait BackoffSchedule: Send + Sync + fmt::Debug {
    /// Delay to apply after the 1-based `attempt` that just failed.
    fn delay_for(&self, attempt: usize, policy: &RetryPolicy) -> Duration;
}

/// The standard schedule: geometric growth from `initial_delay` by
/// `backoff_multiplier`, capped by `max_delay` when the policy sets one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExponentialBackoff;

impl BackoffSchedule for ExponentialBackoff {
    fn delay_for(&self, attempt: usize, policy: &RetryPolicy) -> Duration {
        if attempt == 0 {
            // Attempt indices are 1-based; 0 means nothing failed yet.
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let factor = policy.backoff_multiplier().powi(exponent);
        let secs = policy.initial_delay().as_secs_f64() * factor;
        let raw = if secs.is_finite() {
            Duration::try_from_secs_f64(secs).unwrap_or(MAX_BACKOFF)
        } else {
            MAX_BACKOFF
        };
        let capped = policy.max_delay().map(|max| raw.min(max)).unwrap_or(raw);
        capped.min(MAX_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial_ms: u64, multiplier: f64) -> RetryPolicy {
        RetryPolicy::builder()
            .initial_delay(Duration::from_millis(initial_ms))
            .backoff_multiplier(multiplier)
            .build()
            .unwrap()
    }

    #[test]
    fn doubles_each_retry_with_default_multiplier() {
        let policy = policy(100, 2.0);
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(1, &policy), Duration::from_millis(100)); // 100 * 2^0
        assert_eq!(backoff.delay_for(2, &policy), Duration::from_millis(200)); // 100 * 2^1
        assert_eq!(backoff.delay_for(3, &policy), Duration::from_millis(400)); // 100 * 2^2
        assert_eq!(backoff.delay_for(4, &policy), Duration::from_millis(800)); // 100 * 2^3
    }

    #[test]
    fn multiplier_of_one_keeps_delay_constant() {
        let policy = policy(250, 1.0);
        let backoff = ExponentialBackoff;
        for attempt in 1..=10 {
            assert_eq!(backoff.delay_for(attempt, &policy), Duration::from_millis(250));
        }
    }

    #[test]
    fn fractional_multiplier_grows_geometrically() {
        let policy = policy(1000, 1.5);
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(1, &policy), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(2, &policy), Duration::from_millis(1500));
        assert_eq!(backoff.delay_for(3, &policy), Duration::from_millis(2250));
    }

    #[test]
    fn matches_closed_form_across_the_budget() {
        let policy = policy(100, 2.0);
        let backoff = ExponentialBackoff;
        for attempt in 1..=8usize {
            let expected = Duration::from_millis(100 * 2u64.pow(attempt as u32 - 1));
            assert_eq!(backoff.delay_for(attempt, &policy), expected);
        }
    }

    #[test]
    fn zero_attempt_has_no_delay() {
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(0, &RetryPolicy::default()), Duration::ZERO);
    }

    #[test]
    fn respects_configured_cap() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .backoff_multiplier(2.0)
            .max_delay(Duration::from_secs(1))
            .build()
            .unwrap();
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(3, &policy), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(5, &policy), Duration::from_secs(1)); // capped
        assert_eq!(backoff.delay_for(20, &policy), Duration::from_secs(1)); // still capped
    }

    #[test]
    fn huge_attempt_saturates_instead_of_overflowing() {
        let policy = policy(1000, 2.0);
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(1_000_000_000, &policy), MAX_BACKOFF);
    }

    #[test]
    fn saturation_still_honors_smaller_cap() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_secs(1))
            .backoff_multiplier(10.0)
            .max_delay(Duration::from_secs(60))
            .build()
            .unwrap();
        let backoff = ExponentialBackoff;
        assert_eq!(backoff.delay_for(500, &policy), Duration::from_secs(60));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let policy = policy(333, 1.7);
        let backoff = ExponentialBackoff;
        let first = backoff.delay_for(4, &policy);
        for _ in 0..10 {
            assert_eq!(backoff.delay_for(4, &policy), first);
        }
    }
}
