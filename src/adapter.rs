//! Call-site binding between endpoints and the shared executor.
//!
//! This is the only place that knows about concrete endpoints. A
//! [`RemoteClient`] pairs an injected [`Transport`] with one [`Executor`];
//! each distinct remote operation becomes a [`CallSite`] that captures its
//! endpoint in a zero-argument closure and delegates to the shared retry
//! loop; the loop body exists exactly once, in the executor. The adapter
//! also owns user-facing reporting: terminal outcomes are logged here, not
//! in the executor.
//!
//! ```rust,no_run
//! # use async_trait::async_trait;
//! # use redial::{Endpoint, Executor, RemoteClient};
//! # struct Http;
//! # #[async_trait]
//! # impl redial::Transport for Http {
//! #     type Payload = String;
//! #     type Error = std::io::Error;
//! #     async fn fetch(&self, _: &Endpoint) -> Result<String, std::io::Error> { Ok(String::new()) }
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = RemoteClient::new(Http, Executor::builder().build());
//! let users = client.site("/users/42").call().await;
//! let orders = client.site("/orders/42").call().await;
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::executor::Executor;
use crate::outcome::Outcome;

/// Identity of a remote operation's target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Create an endpoint from a path-like identity.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The endpoint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self(path.to_owned())
    }
}

impl From<String> for Endpoint {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// The injected remote collaborator.
///
/// Implementations perform the actual I/O (an HTTP client, a message bus, a
/// deterministic fake in tests). The executor never constructs or inspects
/// one; it only sees the closure a [`CallSite`] builds around it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// What a successful fetch yields. Opaque to the retry machinery.
    type Payload: Send;
    /// What a failed fetch raises. Classified, never interpreted.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the payload behind `endpoint`.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Self::Payload, Self::Error>;
}

/// A transport plus the one shared executor every call site delegates to.
pub struct RemoteClient<T: Transport> {
    transport: Arc<T>,
    executor: Executor<T::Error>,
}

impl<T: Transport> Clone for RemoteClient<T> {
    fn clone(&self) -> Self {
        Self { transport: self.transport.clone(), executor: self.executor.clone() }
    }
}

impl<T: Transport> fmt::Debug for RemoteClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClient")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> RemoteClient<T> {
    /// Pair a transport with the executor all its call sites share.
    pub fn new(transport: T, executor: Executor<T::Error>) -> Self {
        Self { transport: Arc::new(transport), executor }
    }

    /// Bind an endpoint, producing a reusable call site.
    pub fn site(&self, endpoint: impl Into<Endpoint>) -> CallSite<T> {
        CallSite {
            endpoint: endpoint.into(),
            transport: self.transport.clone(),
            executor: self.executor.clone(),
        }
    }
}

/// One endpoint bound to the shared executor.
pub struct CallSite<T: Transport> {
    endpoint: Endpoint,
    transport: Arc<T>,
    executor: Executor<T::Error>,
}

impl<T: Transport> Clone for CallSite<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            transport: self.transport.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for CallSite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSite").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl<T: Transport> CallSite<T> {
    /// The endpoint this site targets.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Execute the remote call under the shared retry policy.
    pub async fn call(&self) -> Outcome<T::Payload, T::Error> {
        let outcome = self
            .executor
            .execute(|| {
                let transport = self.transport.clone();
                let endpoint = self.endpoint.clone();
                async move { transport.fetch(&endpoint).await }
            })
            .await;
        self.report(&outcome);
        outcome
    }

    /// Execute the remote call, abandoning retries if `cancel` is raised.
    pub async fn call_cancellable(
        &self,
        cancel: &CancelToken,
    ) -> Outcome<T::Payload, T::Error> {
        let outcome = self
            .executor
            .execute_cancellable(
                || {
                    let transport = self.transport.clone();
                    let endpoint = self.endpoint.clone();
                    async move { transport.fetch(&endpoint).await }
                },
                cancel,
            )
            .await;
        self.report(&outcome);
        outcome
    }

    fn report(&self, outcome: &Outcome<T::Payload, T::Error>) {
        match outcome {
            Outcome::Success { attempts, .. } => {
                tracing::debug!(endpoint = %self.endpoint, attempts, "remote call succeeded");
            }
            Outcome::Fatal { error, attempts } => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    attempts,
                    error = %error,
                    "remote call failed"
                );
            }
            Outcome::Exhausted { error, attempts } => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    attempts,
                    error = %error,
                    "remote call gave up after retries"
                );
            }
            Outcome::Cancelled { attempts } => {
                tracing::debug!(endpoint = %self.endpoint, attempts, "remote call cancelled");
            }
        }
    }
}
