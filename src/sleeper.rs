//! Suspension abstraction.
//!
//! The executor never calls `tokio::time::sleep` directly; it goes through a
//! [`Sleeper`] so tests can replace wall-clock waits with instant or recorded
//! ones. Suspension is scoped to one execution: a sleeping call never blocks
//! unrelated in-flight executions.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Applies the delay between attempts.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    /// Suspend the current execution for `duration`.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test sleeper that resolves immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

/// Test sleeper that records every requested delay and resolves immediately.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    recorded: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    /// Create an empty tracking sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().unwrap().clone()
    }

    /// Number of suspensions requested so far.
    pub fn suspensions(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.recorded.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn instant_sleeper_returns_immediately() {
        let start = Instant::now();
        InstantSleeper.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn tracking_sleeper_records_in_order() {
        let sleeper = TrackingSleeper::new();
        sleeper.sleep(Duration::from_millis(100)).await;
        sleeper.sleep(Duration::from_millis(200)).await;
        sleeper.sleep(Duration::from_millis(400)).await;

        assert_eq!(sleeper.suspensions(), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[tokio::test]
    async fn tracking_sleeper_clones_share_the_record() {
        let sleeper = TrackingSleeper::new();
        let clone = sleeper.clone();
        clone.sleep(Duration::from_millis(50)).await;
        assert_eq!(sleeper.suspensions(), 1);
    }

    #[tokio::test]
    async fn tokio_sleeper_waits_for_real() {
        let start = Instant::now();
        TokioSleeper.sleep(Duration::from_millis(50)).await;
        // Small tolerance for timer coarseness.
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
