//! Retry executor for fallible async remote operations.
//!
//! Semantics:
//! - `policy.max_attempts` counts total invocations (initial try + retries).
//! - Every failure is classified; only [`ErrorKind::Transient`] errors are
//!   eligible for retry, [`ErrorKind::Fatal`] returns immediately.
//! - The delay before attempt `n + 1` comes from the backoff schedule for the
//!   attempt `n` that just failed, then jitter is applied.
//! - The sleeper controls how delays are applied (production uses
//!   [`TokioSleeper`]; tests inject `InstantSleeper`/`TrackingSleeper`).
//! - A cancellation token, when supplied, is checked before the first
//!   invocation and raced against every suspension.
//!
//! Invariants:
//! - Attempts never exceed `policy.max_attempts`.
//! - A success returns immediately, with no further attempts and no delay.
//! - Once a fatal error is observed, no further attempts occur.
//! - One `execute` call is one independent attempt sequence; executions share
//!   no mutable state.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use redial::{ErrorKind, Executor, InstantSleeper, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct Flaky;
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "connection timed out")
//!     }
//! }
//! impl std::error::Error for Flaky {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let executor = Executor::<Flaky>::builder()
//!     .policy(RetryPolicy::builder().max_attempts(3).build().unwrap())
//!     .classifier(|_: &Flaky| ErrorKind::Transient)
//!     .sleeper(InstantSleeper)
//!     .build();
//!
//! let outcome = executor.execute(|| async { Err::<(), _>(Flaky) }).await;
//! assert!(outcome.is_exhausted());
//! assert_eq!(outcome.attempts(), 3);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tower_layer::Layer;
use tower_service::Service;

use crate::backoff::{BackoffSchedule, ExponentialBackoff};
use crate::cancel::CancelToken;
use crate::classify::{Classifier, ErrorKind, FatalByDefault};
use crate::jitter::Jitter;
use crate::outcome::{CallError, Outcome};
use crate::policy::RetryPolicy;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::telemetry::{AttemptRecord, CallEvent, EventSink, TracingSink};

/// Shared retry executor: policy, classifier, backoff, jitter, sleeper, and
/// event sink, wired together once and reused by every call site.
///
/// Cloning is cheap; clones share the same read-only configuration.
pub struct Executor<E> {
    policy: RetryPolicy,
    classifier: Arc<dyn Classifier<E>>,
    backoff: Arc<dyn BackoffSchedule>,
    jitter: Jitter,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn EventSink>,
}

impl<E> Clone for Executor<E> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            classifier: self.classifier.clone(),
            backoff: self.backoff.clone(),
            jitter: self.jitter,
            sleeper: self.sleeper.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<E> fmt::Debug for Executor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("policy", &self.policy)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("classifier", &"<classifier>")
            .field("sleeper", &self.sleeper)
            .field("sink", &self.sink)
            .finish()
    }
}

impl<E> Executor<E> {
    /// Construct a new builder with defaults.
    pub fn builder() -> ExecutorBuilder<E> {
        ExecutorBuilder::new()
    }

    /// The policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry semantics.
    ///
    /// The operation is a zero-argument closure producing a fresh future per
    /// invocation. The returned [`Outcome`] is the sole channel for
    /// success/fatal/exhausted information; expected failures are never
    /// thrown.
    pub async fn execute<T, Fut, Op>(&self, operation: Op) -> Outcome<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, None).await
    }

    /// Execute with a cancellation token.
    ///
    /// A cancellation raised while the executor is suspended between
    /// attempts returns [`Outcome::Cancelled`] without invoking the
    /// operation again; one raised before the first invocation returns with
    /// zero attempts.
    pub async fn execute_cancellable<T, Fut, Op>(
        &self,
        operation: Op,
        cancel: &CancelToken,
    ) -> Outcome<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, Some(cancel)).await
    }

    async fn run<T, Fut, Op>(
        &self,
        mut operation: Op,
        cancel: Option<&CancelToken>,
    ) -> Outcome<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                self.sink.record(&CallEvent::Cancelled { attempts: 0 });
                return Outcome::Cancelled { attempts: 0 };
            }
        }

        let mut attempt = 1usize;
        loop {
            match operation().await {
                Ok(value) => {
                    self.sink.record(&CallEvent::Succeeded { attempts: attempt });
                    return Outcome::Success { value, attempts: attempt };
                }
                Err(error) => match self.classifier.classify(&error) {
                    ErrorKind::Fatal => {
                        self.sink.record(&CallEvent::Failed(AttemptRecord {
                            attempt,
                            kind: ErrorKind::Fatal,
                            delay: None,
                        }));
                        self.sink.record(&CallEvent::FatalError { attempts: attempt });
                        return Outcome::Fatal { error, attempts: attempt };
                    }
                    ErrorKind::Transient => {
                        if attempt >= self.policy.max_attempts() {
                            self.sink.record(&CallEvent::Failed(AttemptRecord {
                                attempt,
                                kind: ErrorKind::Transient,
                                delay: None,
                            }));
                            self.sink.record(&CallEvent::Exhausted { attempts: attempt });
                            return Outcome::Exhausted { error, attempts: attempt };
                        }

                        let base = self.backoff.delay_for(attempt, &self.policy);
                        let delay = self.jitter.apply(base);
                        self.sink.record(&CallEvent::Failed(AttemptRecord {
                            attempt,
                            kind: ErrorKind::Transient,
                            delay: Some(delay),
                        }));

                        if !self.suspend(delay, cancel).await {
                            self.sink.record(&CallEvent::Cancelled { attempts: attempt });
                            return Outcome::Cancelled { attempts: attempt };
                        }
                        attempt += 1;
                    }
                },
            }
        }
    }

    /// Sleep for `delay`, racing the cancellation token when one is present.
    /// Returns `false` if cancellation won the race.
    async fn suspend(&self, delay: Duration, cancel: Option<&CancelToken>) -> bool {
        match cancel {
            None => {
                self.sleeper.sleep(delay).await;
                true
            }
            Some(token) => {
                tokio::select! {
                    _ = self.sleeper.sleep(delay) => true,
                    _ = token.cancelled() => false,
                }
            }
        }
    }
}

/// Builder for [`Executor`].
///
/// Defaults: default [`RetryPolicy`], fail-closed classifier
/// ([`FatalByDefault`]: nothing retries until the caller says what is
/// transient), [`ExponentialBackoff`], no jitter, [`TokioSleeper`],
/// [`TracingSink`].
pub struct ExecutorBuilder<E> {
    policy: RetryPolicy,
    classifier: Arc<dyn Classifier<E>>,
    backoff: Arc<dyn BackoffSchedule>,
    jitter: Jitter,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn EventSink>,
}

impl<E> ExecutorBuilder<E> {
    /// Create a builder with the documented defaults.
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            classifier: Arc::new(FatalByDefault),
            backoff: Arc::new(ExponentialBackoff),
            jitter: Jitter::None,
            sleeper: Arc::new(TokioSleeper),
            sink: Arc::new(TracingSink),
        }
    }

    /// Set the retry policy.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the error classifier. Plain `Fn(&E) -> ErrorKind` closures work.
    pub fn classifier<C>(mut self, classifier: C) -> Self
    where
        C: Classifier<E> + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Set the backoff schedule.
    pub fn backoff<B>(mut self, backoff: B) -> Self
    where
        B: BackoffSchedule + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Set the jitter strategy.
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Provide a custom sleeper implementation.
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide a custom event sink.
    pub fn sink<K>(mut self, sink: K) -> Self
    where
        K: EventSink + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    /// Build the executor. Policy validation happens when the policy itself
    /// is built, so this step cannot fail.
    pub fn build(self) -> Executor<E> {
        Executor {
            policy: self.policy,
            classifier: self.classifier,
            backoff: self.backoff,
            jitter: self.jitter,
            sleeper: self.sleeper,
            sink: self.sink,
        }
    }
}

impl<E> Default for ExecutorBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tower-native retry layer around an [`Executor`].
pub struct RetryLayer<E> {
    executor: Executor<E>,
}

impl<E> RetryLayer<E> {
    /// Wrap services with the given executor's retry behavior.
    pub fn new(executor: Executor<E>) -> Self {
        Self { executor }
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self { executor: self.executor.clone() }
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = RetryService<S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService { inner, executor: self.executor.clone() }
    }
}

/// Retry service produced by [`RetryLayer`].
pub struct RetryService<S, E> {
    inner: S,
    executor: Executor<E>,
}

impl<S: Clone, E> Clone for RetryService<S, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), executor: self.executor.clone() }
    }
}

impl<S, E, Request> Service<Request> for RetryService<S, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<E> + Send,
    S::Future: Send + 'static,
    E: Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = CallError<E>;
    type Future = BoxFuture<'static, Result<S::Response, CallError<E>>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        // Readiness failures happen before any invocation.
        self.inner
            .poll_ready(cx)
            .map_err(|e| CallError::Fatal { error: e.into(), attempts: 0 })
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let executor = self.executor.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            let outcome = executor
                .execute(move || {
                    let mut service = inner.clone();
                    let req = req.clone();
                    async move { service.call(req).await.map_err(Into::into) }
                })
                .await;
            outcome.into_result()
        })
    }
}
