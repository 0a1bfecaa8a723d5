//! Integration tests for the resilience pipeline
//!
//! Exercises the stages together through the public API with a caller-defined
//! error type, the way downstream crates use them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use feedline_common::resilience::{
    BackoffStrategy, CircuitState, MockClock, ResilienceFailure, ResiliencePipeline, RetryConfig,
    RetryGuard,
};
use futures::future::join_all;
use thiserror::Error;

/// Caller-owned error type, as a repository crate would define it
#[derive(Debug, Error)]
enum FetchError {
    #[error("timed out after {limit:?}")]
    Timeout { limit: Duration },
    #[error("circuit open")]
    CircuitOpen,
    #[error("network: {0}")]
    Network(String),
}

impl ResilienceFailure for FetchError {
    fn timed_out(limit: Duration) -> Self {
        Self::Timeout { limit }
    }

    fn circuit_open() -> Self {
        Self::CircuitOpen
    }

    fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }
}

/// Validates the end-to-end scenario: every attempt hangs, and the breaker
/// counts whole retry sequences rather than individual attempts.
///
/// # Test Steps
/// 1. Build Timeout(100ms) -> Retry(3, 50ms x 2) -> Breaker(3, 1000ms)
/// 2. Issue three outer calls against an operation that never completes
/// 3. Check the breaker after each outer call
/// 4. Issue a fourth call
///
/// # Assertions
/// - Each outer call fails with the last attempt's timeout after 3 attempts
/// - The breaker stays closed after calls 1 and 2 and opens after call 3
/// - The fourth call is rejected without invoking the operation
#[tokio::test(flavor = "multi_thread")]
async fn test_timeouts_open_breaker_only_after_third_outer_call() {
    let pipeline = ResiliencePipeline::<FetchError>::builder()
        .timeout(Duration::from_millis(100))
        .retry_with_backoff(3, BackoffStrategy::exponential(Duration::from_millis(50), 2.0))
        .circuit_breaker(3, Duration::from_millis(1000))
        .build()
        .expect("pipeline config is valid");
    let breaker = pipeline.circuit_breaker().expect("breaker configured");
    let attempts = AtomicU32::new(0);

    let hang = || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async {
            std::future::pending::<()>().await;
            Ok::<(), FetchError>(())
        }
    };

    for outer in 1..=3u32 {
        let started = Instant::now();
        let result = pipeline.execute(hang).await;

        assert!(
            matches!(result, Err(FetchError::Timeout { limit }) if limit == Duration::from_millis(100)),
            "outer call {outer} should surface the last timeout"
        );
        assert_eq!(attempts.load(Ordering::SeqCst), outer * 3);
        // 3 x 100ms attempts + 50ms + 100ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(450));

        let expected = if outer < 3 { CircuitState::Closed } else { CircuitState::Open };
        assert_eq!(breaker.state(), expected, "after outer call {outer}");
        assert_eq!(breaker.metrics().consecutive_failures, outer);
    }

    let rejected = pipeline.execute(hang).await;
    assert!(matches!(rejected, Err(FetchError::CircuitOpen)));
    assert_eq!(attempts.load(Ordering::SeqCst), 9);
}

/// Validates that concurrent callers in the half-open window produce exactly
/// one invocation.
///
/// # Test Steps
/// 1. Open a threshold-1 breaker driven by a mock clock
/// 2. Advance past the cooldown
/// 3. Fire 8 concurrent calls whose operation takes 100ms
///
/// # Assertions
/// - The operation runs exactly once
/// - Exactly one call succeeds and the other 7 are rejected as circuit-open
/// - The breaker ends up closed
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_half_open_calls_admit_single_trial() {
    let clock = MockClock::new();
    let pipeline = Arc::new(
        ResiliencePipeline::<FetchError>::builder()
            .circuit_breaker(1, Duration::from_secs(10))
            .clock(clock.clone())
            .build()
            .expect("pipeline config is valid"),
    );
    let invocations = Arc::new(AtomicU32::new(0));

    let tripped = pipeline.execute(|| async { Err::<(), _>(FetchError::Network("reset".into())) }).await;
    assert!(matches!(tripped, Err(FetchError::Network(_))));
    clock.advance(Duration::from_secs(10));

    let calls = (0..8).map(|_| {
        let pipeline = Arc::clone(&pipeline);
        let invocations = Arc::clone(&invocations);
        tokio::spawn(async move {
            pipeline
                .execute(|| {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok::<_, FetchError>("fresh")
                    }
                })
                .await
        })
    });
    let results: Vec<_> = join_all(calls).await.into_iter().map(|joined| joined.expect("task panicked")).collect();

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(results.iter().filter(|r| matches!(r, Err(FetchError::CircuitOpen))).count(), 7);
    assert_eq!(pipeline.circuit_breaker().map(|b| b.state()), Some(CircuitState::Closed));
}

/// Validates a retry-only pipeline.
///
/// # Assertions
/// - A failing operation runs exactly twice and surfaces its own error
/// - A slow operation is never cut short (no timeout stage)
/// - No circuit-open rejection ever occurs (no breaker stage)
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_only_pipeline() {
    let pipeline = ResiliencePipeline::<FetchError>::builder()
        .retry_with_backoff(2, BackoffStrategy::Fixed(Duration::from_millis(10)))
        .build()
        .expect("pipeline config is valid");
    let calls = AtomicU32::new(0);

    for round in 1..=5u32 {
        let result = pipeline
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<(), _>(FetchError::Network("connection refused".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(FetchError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), round * 2);
    }
    assert!(pipeline.circuit_breaker().is_none());
}

/// Validates retry statistics for two failures followed by success.
///
/// # Assertions
/// - The success value is returned after 3 attempts
/// - Exactly 2 backoff waits totalling 20ms + 40ms are recorded
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_guard_waits_exactly_twice() {
    let config = RetryConfig::builder()
        .max_attempts(3)
        .exponential_backoff(Duration::from_millis(20), 2.0)
        .build()
        .expect("retry config is valid");
    let guard = RetryGuard::<FetchError>::new(config).expect("retry guard builds");
    let calls = AtomicU32::new(0);

    let started = Instant::now();
    let outcome = guard
        .execute_with_outcome(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(FetchError::Network(format!("attempt {attempt}")))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.backoff_waits, 2);
    assert_eq!(outcome.total_delay, Duration::from_millis(60));
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(outcome.into_result().expect("third attempt succeeds"), 3);
}
