//! Retry policy configuration.
//!
//! A [`RetryPolicy`] is built once by the caller, validated, and then shared
//! read-only by every execution that uses it. Semantics:
//! - `max_attempts` counts total attempts (initial try + retries).
//! - `initial_delay` is the delay applied before the second attempt.
//! - `backoff_multiplier` scales the delay for each further retry.
//! - `max_delay`, when set, caps every computed delay.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use redial::RetryPolicy;
//!
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .initial_delay(Duration::from_millis(250))
//!     .backoff_multiplier(1.5)
//!     .max_delay(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//! assert_eq!(policy.max_attempts(), 5);
//! ```

use std::time::Duration;

use thiserror::Error;

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// `max_attempts` must be at least 1.
    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(usize),
    /// `initial_delay` must be greater than zero.
    #[error("initial_delay must be greater than zero")]
    ZeroInitialDelay,
    /// `backoff_multiplier` must be a finite number >= 1.0.
    #[error("backoff_multiplier must be a finite number >= 1.0 (got {0})")]
    InvalidMultiplier(f64),
    /// `max_delay` must not be smaller than `initial_delay`.
    #[error("max_delay ({max:?}) must be >= initial_delay ({initial:?})")]
    MaxDelayBelowInitial {
        /// Configured initial delay.
        initial: Duration,
        /// Offending cap.
        max: Duration,
    },
}

/// Immutable retry configuration.
///
/// Constructed via [`RetryPolicy::builder`]; never mutated mid-execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
}

impl RetryPolicy {
    /// Construct a new builder with defaults (3 attempts, 1s initial delay,
    /// multiplier 2.0, no cap).
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Total attempts allowed for one execution, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay applied before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Growth factor applied to the delay for each further retry.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Optional upper bound on any computed delay.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: None,
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: usize,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Create a builder with the documented defaults.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: None,
        }
    }

    /// Set total attempts (initial + retries). Must be >= 1.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay applied before the first retry. Must be > 0.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the growth factor. Must be finite and >= 1.0.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Cap every computed delay at `max`.
    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Build the policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy, PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::InvalidMaxAttempts(0));
        }
        if self.initial_delay.is_zero() {
            return Err(PolicyError::ZeroInitialDelay);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(self.backoff_multiplier));
        }
        if let Some(max) = self.max_delay {
            if max < self.initial_delay {
                return Err(PolicyError::MaxDelayBelowInitial {
                    initial: self.initial_delay,
                    max,
                });
            }
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            backoff_multiplier: self.backoff_multiplier,
            max_delay: self.max_delay,
        })
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
