//! Optional delay randomization.
//!
//! Jitter spreads retries from concurrent callers so they do not hammer a
//! recovering endpoint in lockstep. It is applied by the executor *after* the
//! deterministic [`crate::backoff`] computation, so the schedule itself stays
//! testable; deterministic tests either use [`Jitter::None`] or inject a
//! seeded RNG through [`Jitter::apply_with_rng`].
//!
//! Strategies:
//! - `None`: use the exact backoff delay (the default).
//! - `Full`: uniform in `[0, delay]`.
//! - `Equal`: uniform in `[delay/2, delay]`, keeps a floor under the wait.

use rand::{rng, Rng};
use std::time::Duration;

/// Jitter strategy for randomizing retry delays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter; the backoff delay is used as computed.
    #[default]
    None,
    /// Uniform random delay in `[0, delay]`.
    Full,
    /// Uniform random delay in `[delay/2, delay]`.
    Equal,
}

impl Jitter {
    /// Apply jitter to a delay using the thread-local RNG.
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rng();
        self.apply_with_rng(delay, &mut rng)
    }

    /// Apply jitter with a caller-supplied RNG (seed it for deterministic
    /// tests).
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => {
                let millis = as_millis_saturated(delay);
                if millis == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rng.random_range(0..=millis))
            }
            Jitter::Equal => {
                let millis = as_millis_saturated(delay);
                if millis == 0 {
                    return Duration::ZERO;
                }
                let half = millis / 2;
                Duration::from_millis(rng.random_range(half..=millis))
            }
        }
    }
}

fn as_millis_saturated(duration: Duration) -> u64 {
    // Saturate extremely large durations instead of panicking.
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}
