//! Terminal results of one execution.
//!
//! An [`Outcome`] is the sole channel for success/failure/cancellation
//! information: nothing on the expected path is thrown. Callers
//! pattern-match, or use the accessors, or convert to a `Result` via
//! [`Outcome::into_result`] when a `?`-friendly shape is needed (the tower
//! service does exactly that).

use std::fmt;

/// Final result of one `execute` call.
///
/// `attempts` is the number of times the operation was invoked; a
/// cancellation observed before the first invocation carries `attempts: 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The operation produced a value.
    Success {
        /// Payload returned by the operation. Opaque to the executor.
        value: T,
        /// Invocations made, including the successful one.
        attempts: usize,
    },
    /// A fatal error ended the execution immediately.
    Fatal {
        /// The fatal error.
        error: E,
        /// Invocations made when the fatal error was observed.
        attempts: usize,
    },
    /// Every attempt failed transiently and the budget ran out.
    Exhausted {
        /// The last transient error observed.
        error: E,
        /// Invocations made; always equals the policy's `max_attempts`.
        attempts: usize,
    },
    /// The caller's cancellation signal stopped the execution.
    Cancelled {
        /// Invocations made before cancellation took effect.
        attempts: usize,
    },
}

impl<T, E> Outcome<T, E> {
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Success { attempts, .. }
            | Self::Fatal { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Whether the execution produced a value.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether a fatal error ended the execution.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Whether the attempt budget ran out on transient failures.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Whether the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Borrow the payload if this is a success.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Extract the payload if this is a success.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Borrow the terminal error, fatal or last-transient.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Convert to a `Result`, mapping the non-success variants onto
    /// [`CallError`].
    pub fn into_result(self) -> Result<T, CallError<E>> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Fatal { error, attempts } => Err(CallError::Fatal { error, attempts }),
            Self::Exhausted { error, attempts } => {
                Err(CallError::Exhausted { error, attempts })
            }
            Self::Cancelled { attempts } => Err(CallError::Cancelled { attempts }),
        }
    }
}

/// `Result`-shaped view of the non-success outcomes.
///
/// Used as the error type of the tower service; mirrors [`Outcome`] minus
/// the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError<E> {
    /// A fatal error ended the execution immediately.
    Fatal {
        /// The fatal error.
        error: E,
        /// Invocations made when the fatal error was observed.
        attempts: usize,
    },
    /// Every attempt failed transiently and the budget ran out.
    Exhausted {
        /// The last transient error observed.
        error: E,
        /// Invocations made.
        attempts: usize,
    },
    /// The caller's cancellation signal stopped the execution.
    Cancelled {
        /// Invocations made before cancellation took effect.
        attempts: usize,
    },
}

impl<E> CallError<E> {
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Fatal { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Borrow the underlying error, if any.
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            Self::Cancelled { .. } => None,
        }
    }

    /// Extract the underlying error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            Self::Cancelled { .. } => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal { error, attempts } => {
                write!(f, "fatal error on attempt {}: {}", attempts, error)
            }
            Self::Exhausted { error, attempts } => {
                write!(
                    f,
                    "retry budget exhausted after {} attempts; last error: {}",
                    attempts, error
                )
            }
            Self::Cancelled { attempts } => {
                write!(f, "cancelled after {} attempt(s)", attempts)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CallError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            Self::Cancelled { .. } => None,
        }
    }
}
