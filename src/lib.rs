#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # redial
//!
//! Resilient remote-call execution for async Rust: one shared retry loop
//! instead of a copy per call site.
//!
//! ## What it does
//!
//! - **Retry executor** that wraps any fallible async operation, budgets
//!   attempts, and returns a single terminal [`Outcome`]
//! - **Error classification** into transient vs fatal, fail-closed
//! - **Exponential backoff** computed deterministically, with optional
//!   injected jitter
//! - **Cancellation** that interrupts the wait between attempts
//! - **Call-site adapter** binding endpoints to one shared executor
//! - **Tower layer** for service stacks
//!
//! The executor never constructs or inspects the remote transport; the
//! operation is an opaque closure supplied by the caller, which keeps the
//! whole machine testable with deterministic fakes.
//!
//! ## Quick Start
//!
//! ```rust
//! use redial::{ErrorKind, Executor, InstantSleeper, RetryPolicy};
//!
//! #[derive(Debug)]
//! enum ApiError {
//!     Timeout,
//!     BadRequest,
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let executor = Executor::<ApiError>::builder()
//!     .policy(RetryPolicy::builder().max_attempts(3).build().unwrap())
//!     .classifier(|error: &ApiError| match error {
//!         ApiError::Timeout => ErrorKind::Transient,
//!         ApiError::BadRequest => ErrorKind::Fatal,
//!     })
//!     .sleeper(InstantSleeper)
//!     .build();
//!
//! let outcome = executor
//!     .execute(|| async { Ok::<_, ApiError>("payload") })
//!     .await;
//! assert_eq!(outcome.into_value(), Some("payload"));
//! # });
//! ```

pub mod adapter;
pub mod backoff;
pub mod cancel;
pub mod classify;
pub mod executor;
pub mod jitter;
pub mod outcome;
pub mod policy;
pub mod sleeper;
pub mod telemetry;

// Re-exports
pub use adapter::{CallSite, Endpoint, RemoteClient, Transport};
pub use backoff::{BackoffSchedule, ExponentialBackoff, MAX_BACKOFF};
pub use cancel::{CancelHandle, CancelToken};
pub use classify::{Classifier, ErrorKind, FatalByDefault};
pub use executor::{Executor, ExecutorBuilder, RetryLayer, RetryService};
pub use jitter::Jitter;
pub use outcome::{CallError, Outcome};
pub use policy::{PolicyError, RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use telemetry::{
    AttemptRecord, CallEvent, CollectingSink, EventSink, NullSink, TracingSink,
};
