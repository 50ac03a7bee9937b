use redial::{
    BackoffSchedule, CallError, CancelHandle, ErrorKind, Executor, ExponentialBackoff,
    InstantSleeper, Jitter, Outcome, RetryLayer, RetryPolicy, TrackingSleeper,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestError {
    Timeout,
    RateLimited,
    BadRequest,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Timeout => write!(f, "connection timed out"),
            TestError::RateLimited => write!(f, "429 too many requests"),
            TestError::BadRequest => write!(f, "400 bad request"),
        }
    }
}

impl std::error::Error for TestError {}

fn classify(error: &TestError) -> ErrorKind {
    match error {
        TestError::Timeout | TestError::RateLimited => ErrorKind::Transient,
        TestError::BadRequest => ErrorKind::Fatal,
    }
}

fn executor_with(sleeper: TrackingSleeper, policy: RetryPolicy) -> Executor<TestError> {
    Executor::builder().policy(policy).classifier(classify).sleeper(sleeper).build()
}

#[tokio::test]
async fn executed_delays_match_the_schedule_closed_form() {
    let policy = RetryPolicy::builder()
        .max_attempts(5)
        .initial_delay(Duration::from_millis(100))
        .backoff_multiplier(2.0)
        .build()
        .unwrap();
    let sleeper = TrackingSleeper::new();
    let exec = executor_with(sleeper.clone(), policy.clone());

    let _ = exec.execute(|| async { Err::<(), _>(TestError::Timeout) }).await;

    let recorded = sleeper.recorded();
    assert_eq!(recorded.len(), 4, "four suspensions between five attempts");
    for (i, delay) in recorded.iter().enumerate() {
        let attempt = i + 1;
        assert_eq!(*delay, ExponentialBackoff.delay_for(attempt, &policy));
        assert_eq!(*delay, Duration::from_millis(100 * 2u64.pow(i as u32)));
    }
}

#[tokio::test]
async fn default_policy_applies_one_second_then_two() {
    let sleeper = TrackingSleeper::new();
    let exec = executor_with(sleeper.clone(), RetryPolicy::default());

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    let outcome = exec
        .execute(move || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError::RateLimited)
            }
        })
        .await;

    assert_eq!(outcome, Outcome::Exhausted { error: TestError::RateLimited, attempts: 3 });
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn jittered_delays_never_exceed_the_schedule() {
    let policy = RetryPolicy::builder()
        .max_attempts(6)
        .initial_delay(Duration::from_millis(400))
        .build()
        .unwrap();
    let sleeper = TrackingSleeper::new();
    let exec: Executor<TestError> = Executor::builder()
        .policy(policy.clone())
        .classifier(classify)
        .jitter(Jitter::Full)
        .sleeper(sleeper.clone())
        .build();

    let _ = exec.execute(|| async { Err::<(), _>(TestError::Timeout) }).await;

    let recorded = sleeper.recorded();
    assert_eq!(recorded.len(), 5);
    for (i, delay) in recorded.iter().enumerate() {
        let base = ExponentialBackoff.delay_for(i + 1, &policy);
        assert!(*delay <= base, "jittered delay must stay within the base delay");
    }
}

#[tokio::test]
async fn equal_jitter_keeps_a_floor_under_the_wait() {
    let policy = RetryPolicy::builder()
        .max_attempts(4)
        .initial_delay(Duration::from_millis(1000))
        .backoff_multiplier(1.0)
        .build()
        .unwrap();
    let sleeper = TrackingSleeper::new();
    let exec: Executor<TestError> = Executor::builder()
        .policy(policy)
        .classifier(classify)
        .jitter(Jitter::Equal)
        .sleeper(sleeper.clone())
        .build();

    let _ = exec.execute(|| async { Err::<(), _>(TestError::Timeout) }).await;

    for delay in sleeper.recorded() {
        assert!(delay >= Duration::from_millis(500));
        assert!(delay <= Duration::from_millis(1000));
    }
}

#[tokio::test]
async fn mixed_transient_kinds_share_one_budget() {
    let sleeper = TrackingSleeper::new();
    let exec = executor_with(
        sleeper.clone(),
        RetryPolicy::builder()
            .max_attempts(3)
            .initial_delay(Duration::from_millis(10))
            .build()
            .unwrap(),
    );

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    let outcome = exec
        .execute(move || {
            let attempts = attempts_clone.clone();
            async move {
                match attempts.fetch_add(1, Ordering::SeqCst) {
                    0 => Err::<(), _>(TestError::Timeout),
                    1 => Err(TestError::RateLimited),
                    _ => Err(TestError::Timeout),
                }
            }
        })
        .await;

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.attempts(), 3);
}

#[tokio::test]
async fn cancellation_between_attempts_preempts_the_wait() {
    let exec: Executor<TestError> = Executor::builder()
        .policy(
            RetryPolicy::builder()
                .max_attempts(5)
                .initial_delay(Duration::from_secs(60))
                .build()
                .unwrap(),
        )
        .classifier(classify)
        .build();

    let handle = CancelHandle::new();
    let token = handle.token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    let started = std::time::Instant::now();
    let outcome = exec
        .execute_cancellable(
            move || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError::Timeout)
                }
            },
            &token,
        )
        .await;

    assert_eq!(outcome, Outcome::Cancelled { attempts: 1 });
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(60), "did not sit out the backoff");
}

#[tokio::test]
async fn tower_service_retries_like_the_executor() {
    let exec: Executor<TestError> = Executor::builder()
        .policy(RetryPolicy::builder().max_attempts(4).build().unwrap())
        .classifier(classify)
        .sleeper(InstantSleeper)
        .build();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let flaky = tower::service_fn(move |name: &'static str| {
        let calls = calls_clone.clone();
        async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(TestError::Timeout)
            } else {
                Ok(format!("hello {name}"))
            }
        }
    });

    let mut service = RetryLayer::new(exec).layer(flaky);
    let response = service.ready().await.unwrap().call("world").await.unwrap();

    assert_eq!(response, "hello world");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn tower_service_reports_exhaustion_as_a_call_error() {
    let exec: Executor<TestError> = Executor::builder()
        .policy(RetryPolicy::builder().max_attempts(2).build().unwrap())
        .classifier(classify)
        .sleeper(InstantSleeper)
        .build();

    let always_down =
        tower::service_fn(|_: ()| async { Err::<(), _>(TestError::RateLimited) });
    let mut service = RetryLayer::new(exec).layer(always_down);

    let err = service.ready().await.unwrap().call(()).await.unwrap_err();
    assert_eq!(err, CallError::Exhausted { error: TestError::RateLimited, attempts: 2 });
}

#[tokio::test]
async fn tower_service_does_not_retry_fatal_errors() {
    let exec: Executor<TestError> = Executor::builder()
        .policy(RetryPolicy::builder().max_attempts(5).build().unwrap())
        .classifier(classify)
        .sleeper(InstantSleeper)
        .build();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let broken = tower::service_fn(move |_: ()| {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TestError::BadRequest)
        }
    });

    let mut service = RetryLayer::new(exec).layer(broken);
    let err = service.ready().await.unwrap().call(()).await.unwrap_err();

    assert_eq!(err, CallError::Fatal { error: TestError::BadRequest, attempts: 1 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
