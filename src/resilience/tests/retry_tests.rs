//! Retry decorator tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::resilience::{
    domain::{BreakerConfig, BreakerState, CircuitError, RetryPolicy},
    services::{CircuitBreaker, with_breaker, with_retry},
};
use crate::test_support::{FakeDependencyError, ManualClock};
use rstest::rstest;

const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2));

#[rstest]
#[case(0, 1_000)]
#[case(1, 2_000)]
#[case(2, 4_000)]
#[case(3, 5_000)]
#[case(40, 5_000)]
fn github_delays_grow_exponentially_up_to_cap(#[case] attempt: u32, #[case] expected_ms: u64) {
    assert_eq!(
        RetryPolicy::github().delay_for(attempt),
        Duration::from_millis(expected_ms)
    );
}

#[rstest]
fn ai_policy_uses_its_own_budget() {
    let policy = RetryPolicy::ai();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.delay_for(0), Duration::from_millis(2_000));
    assert_eq!(policy.delay_for(5), Duration::from_millis(10_000));
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let calls = AtomicU32::new(0);

    let result = with_retry(FAST, || async {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        if attempt < 2 {
            Err(FakeDependencyError::transient("flaky"))
        } else {
            Ok(attempt)
        }
    })
    .await;

    assert_eq!(result, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_budget_surfaces_last_error() {
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = with_retry(FAST, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(FakeDependencyError::transient("still down"))
    })
    .await;

    assert_eq!(result, Err(FakeDependencyError::transient("still down")));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn permanent_failures_are_not_retried() {
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = with_retry(FAST, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(FakeDependencyError::permanent("unauthorized"))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn breaker_counts_one_failure_per_exhausted_retry_run() {
    let breaker = CircuitBreaker::new(
        BreakerConfig::new("ai", 2, Duration::from_secs(30), Duration::from_secs(60)),
        Arc::new(ManualClock::new()),
    );
    let calls = AtomicU32::new(0);

    for _ in 0..2 {
        let result: Result<(), _> = with_breaker(&breaker, || {
            with_retry(FAST, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeDependencyError::transient("timeout"))
            })
        })
        .await;
        assert!(matches!(result, Err(CircuitError::Operation(_))));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 8);
    assert_eq!(breaker.state(), BreakerState::Open);
}
