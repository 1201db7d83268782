//! Breaker- and retry-decorated client tests.

use std::sync::Arc;
use std::time::Duration;

use super::support::{Harness, repository};
use crate::delegation::adapters::memory::InMemoryOrchestrator;
use crate::resilience::{
    domain::{BreakerConfig, BreakerState, ExpectedError, RetryPolicy},
    services::CircuitBreaker,
};
use crate::runtime::services::ShutdownHandle;
use crate::workflow::{
    adapters::memory::{InMemoryGitHub, ScriptedAi},
    domain::{AnalysisSource, ChangedFile, PrAnalysis, PullRequest, RiskLevel},
    ports::{AiError, AiService, GitHubClient, GitHubError},
    services::{PrWorkflowService, ResilientAiService, ResilientGitHubClient, ai_breaker_config},
};
use mockable::DefaultClock;
use rstest::rstest;

const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));

fn breaker(threshold: u32) -> Arc<CircuitBreaker<DefaultClock>> {
    Arc::new(CircuitBreaker::new(
        BreakerConfig::new(
            "github",
            threshold,
            Duration::from_secs(60),
            Duration::from_secs(60),
        )
        .with_expected_error(ExpectedError::Code("not_found".to_owned())),
        Arc::new(DefaultClock),
    ))
}

fn github(inner: &InMemoryGitHub, threshold: u32) -> ResilientGitHubClient<DefaultClock> {
    ResilientGitHubClient::new(Arc::new(inner.clone()), breaker(threshold)).with_policy(FAST)
}

#[rstest]
#[tokio::test]
async fn transient_failures_are_retried() {
    let inner = InMemoryGitHub::new().with_files(7, vec![ChangedFile::modified("src/lib.rs", 3, 1)]);
    inner.fail_next(GitHubError::RateLimited);
    inner.fail_next(GitHubError::RateLimited);
    let client = github(&inner, 5);

    let files = client
        .list_pull_request_files(&repository(), 7)
        .await
        .unwrap_or_else(|err| panic!("retries should recover: {err}"));

    assert_eq!(files.len(), 1);
    assert_eq!(inner.calls(), 3);
    assert_eq!(client.breaker().state(), BreakerState::Closed);
}

#[rstest]
#[tokio::test]
async fn exhausted_retries_count_as_one_breaker_failure() {
    let inner = InMemoryGitHub::new();
    for _ in 0..4 {
        inner.fail_next(GitHubError::RateLimited);
    }
    let client = github(&inner, 2);

    let result = client.create_comment(&repository(), 7, "hello").await;

    assert!(matches!(result, Err(GitHubError::RateLimited)));
    assert_eq!(inner.calls(), 4);
    assert_eq!(client.breaker().state(), BreakerState::Closed);
    assert_eq!(client.breaker().status().failure_count, 1);
}

#[rstest]
#[tokio::test]
async fn breaker_opens_after_threshold_logical_failures() {
    let inner = InMemoryGitHub::new();
    for _ in 0..8 {
        inner.fail_next(GitHubError::RateLimited);
    }
    let client = github(&inner, 2);

    let first = client.create_comment(&repository(), 7, "one").await;
    let second = client.create_comment(&repository(), 7, "two").await;
    let third = client.create_comment(&repository(), 7, "three").await;

    assert!(matches!(first, Err(GitHubError::RateLimited)));
    assert!(matches!(second, Err(GitHubError::RateLimited)));
    assert!(matches!(third, Err(GitHubError::CircuitOpen(_))));
    assert_eq!(inner.calls(), 8);
    assert_eq!(client.breaker().state(), BreakerState::Open);
}

#[rstest]
#[tokio::test]
async fn open_breaker_rejects_without_calling_github() {
    let inner = InMemoryGitHub::new();
    let client = github(&inner, 5);
    client.breaker().force_open();

    let result = client.search_issues(&repository(), "login").await;

    assert!(matches!(result, Err(GitHubError::CircuitOpen(_))));
    assert_eq!(inner.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn missing_resources_are_neither_retried_nor_counted() {
    let inner = InMemoryGitHub::new();
    inner.fail_next(GitHubError::NotFound("pull request 404".to_owned()));
    let client = github(&inner, 1);

    let result = client.list_pull_request_files(&repository(), 404).await;

    assert!(matches!(result, Err(GitHubError::NotFound(_))));
    assert_eq!(inner.calls(), 1);
    assert_eq!(client.breaker().state(), BreakerState::Closed);
    assert_eq!(client.breaker().status().failure_count, 0);
}

#[rstest]
#[tokio::test]
async fn ai_outages_trip_the_ai_breaker() {
    let inner = ScriptedAi::new();
    inner.set_unavailable(true);
    let service = ResilientAiService::new(
        Arc::new(inner.clone()),
        Arc::new(CircuitBreaker::new(ai_breaker_config(), Arc::new(DefaultClock))),
    )
    .with_policy(RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(2)));
    let pull_request = PullRequest::new(7, "Tidy", "abc123");

    for _ in 0..3 {
        let result = service.analyze_pull_request(&pull_request, &[]).await;
        assert!(matches!(result, Err(AiError::Unavailable(_))));
    }
    let rejected = service.analyze_pull_request(&pull_request, &[]).await;

    assert!(matches!(rejected, Err(AiError::CircuitOpen(_))));
    assert_eq!(inner.calls(), 6);
    assert_eq!(service.breaker().state(), BreakerState::Open);
}

#[rstest]
#[tokio::test]
async fn open_ai_breaker_falls_back_to_heuristics() {
    let harness = Harness::new(
        InMemoryGitHub::new().with_files(7, vec![ChangedFile::modified("src/lib.rs", 3, 1)]),
        ScriptedAi::new().with_pull_request_analysis(PrAnalysis {
            requires_security_review: true,
            requires_code_review: true,
            requires_testing: true,
            requires_documentation: true,
            requires_performance_review: true,
            requires_deployment_check: true,
            risk_level: RiskLevel::High,
            summary: "everything".to_owned(),
            source: AnalysisSource::Ai,
        }),
        InMemoryOrchestrator::new(),
    );
    let ai = ResilientAiService::new(
        Arc::new(harness.ai.clone()),
        Arc::new(CircuitBreaker::new(ai_breaker_config(), Arc::new(DefaultClock))),
    );
    ai.breaker().force_open();
    let mut deps = harness.deps();
    deps.ai = Arc::new(ai);
    let service = PrWorkflowService::new(deps, ShutdownHandle::detached());

    service
        .process_pull_request(&PullRequest::new(7, "Tidy", "abc123"), &repository(), None)
        .await;

    let context = service
        .context(&repository(), 7)
        .unwrap_or_else(|| panic!("context should be recorded"));
    assert_eq!(context.analysis.source, AnalysisSource::Heuristic);
    assert_eq!(context.analysis.risk_level, RiskLevel::Low);
    assert_eq!(harness.ai.calls(), 0);
}
