//! Cooperative cancellation for in-flight executions.
//!
//! A [`CancelHandle`] is kept by whoever may abort the work; each execution
//! receives a cloned [`CancelToken`]. The executor checks the token before
//! the first invocation and races it against every suspension, so a
//! cancellation raised while the executor sleeps between attempts takes
//! effect without invoking the operation again.
//!
//! Built on `tokio::sync::watch`: cancelling is idempotent, tokens are cheap
//! to clone, and waiting does not spin.

use tokio::sync::watch;

/// Owning side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a handle with no cancellation raised.
    pub fn new() -> Self {
        Self { tx: watch::Sender::new(false) }
    }

    /// Derive a token to hand to an execution.
    pub fn token(&self) -> CancelToken {
        CancelToken { rx: self.tx.subscribe() }
    }

    /// Raise the cancellation signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the signal has been raised.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is raised; resolves immediately if it
    /// already was. If the handle is dropped without cancelling, the signal
    /// can never arrive and this future stays pending.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
