//! In-process execution events.
//!
//! The executor describes its behavior as structured [`CallEvent`]s pushed
//! into an [`EventSink`]. The default sink logs through `tracing`; tests use
//! [`CollectingSink`] to assert on the exact event stream. This is
//! observation only; nothing here exports metrics or persists anything.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::classify::ErrorKind;

/// Per-attempt record: what happened on one invocation and, when a retry
/// follows, the delay applied before it. Records live only for the duration
/// of one execution's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt index.
    pub attempt: usize,
    /// Classification of the error this attempt produced.
    pub kind: ErrorKind,
    /// Delay applied before the next attempt; `None` when this attempt was
    /// terminal.
    pub delay: Option<Duration>,
}

/// Events emitted during one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    /// An invocation failed; carries the classification and the upcoming
    /// delay, if any.
    Failed(AttemptRecord),
    /// The execution produced a value.
    Succeeded {
        /// Invocations made, including the successful one.
        attempts: usize,
    },
    /// A fatal error ended the execution.
    FatalError {
        /// Invocations made.
        attempts: usize,
    },
    /// The attempt budget ran out on transient failures.
    Exhausted {
        /// Invocations made.
        attempts: usize,
    },
    /// The cancellation signal stopped the execution.
    Cancelled {
        /// Invocations made before cancellation took effect.
        attempts: usize,
    },
}

impl fmt::Display for CallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(record) => {
                let kind = match record.kind {
                    ErrorKind::Transient => "transient",
                    ErrorKind::Fatal => "fatal",
                };
                match record.delay {
                    Some(delay) => write!(
                        f,
                        "attempt {} failed ({}); retrying in {:?}",
                        record.attempt, kind, delay
                    ),
                    None => write!(f, "attempt {} failed ({})", record.attempt, kind),
                }
            }
            Self::Succeeded { attempts } => {
                write!(f, "succeeded after {} attempt(s)", attempts)
            }
            Self::FatalError { attempts } => {
                write!(f, "fatal error on attempt {}", attempts)
            }
            Self::Exhausted { attempts } => {
                write!(f, "retry budget exhausted after {} attempts", attempts)
            }
            Self::Cancelled { attempts } => {
                write!(f, "cancelled after {} attempt(s)", attempts)
            }
        }
    }
}

/// Receives execution events.
pub trait EventSink: Send + Sync + fmt::Debug {
    /// Record one event.
    fn record(&self, event: &CallEvent);
}

/// Sink that logs events through `tracing`.
///
/// Attempt failures that will be retried log at `debug`; terminal
/// conditions log at `warn` (except success, which stays at `debug`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &CallEvent) {
        match event {
            CallEvent::Failed(_) | CallEvent::Succeeded { .. } => {
                tracing::debug!(event = %event, "call_event");
            }
            CallEvent::FatalError { .. }
            | CallEvent::Exhausted { .. }
            | CallEvent::Cancelled { .. } => {
                tracing::warn!(event = %event, "call_event");
            }
        }
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &CallEvent) {}
}

/// Test sink that stores every event in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<CallEvent>>>,
}

impl CollectingSink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, in order.
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingSink {
    fn record(&self, event: &CallEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
