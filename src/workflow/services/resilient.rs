//! Breaker- and retry-decorated forge and AI clients.

use crate::delegation::domain::Finding;
use crate::resilience::{
    domain::{BreakerConfig, CircuitError, ExpectedError, RetryPolicy},
    services::{CircuitBreaker, with_retry},
};
use crate::workflow::{
    domain::{ChangedFile, Issue, PrAnalysis, PullRequest, Repository},
    ports::{
        AiError, AiResult, AiService, CommitStatus, GitHubClient, GitHubError, GitHubResult,
        IssueInsights, NewIssue,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default breaker settings for the GitHub API.
///
/// Missing resources are expected and never count as failures.
#[must_use]
pub fn github_breaker_config() -> BreakerConfig {
    BreakerConfig::new(
        "github",
        5,
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
    .with_expected_error(ExpectedError::Code("not_found".to_owned()))
}

/// Default breaker settings for the AI service.
#[must_use]
pub fn ai_breaker_config() -> BreakerConfig {
    BreakerConfig::new("ai", 3, Duration::from_secs(30), Duration::from_secs(60))
}

/// GitHub client whose calls go through a breaker, retried on transient
/// failures.
///
/// The breaker wraps the whole retry run: an exhausted run counts as a
/// single breaker failure, and an open breaker rejects the call before the
/// first attempt.
pub struct ResilientGitHubClient<C>
where
    C: Clock + Send + Sync,
{
    inner: Arc<dyn GitHubClient>,
    breaker: Arc<CircuitBreaker<C>>,
    policy: RetryPolicy,
}

impl<C> ResilientGitHubClient<C>
where
    C: Clock + Send + Sync,
{
    /// Decorates `inner` with `breaker` and the GitHub retry policy.
    #[must_use]
    pub fn new(inner: Arc<dyn GitHubClient>, breaker: Arc<CircuitBreaker<C>>) -> Self {
        Self {
            inner,
            breaker,
            policy: RetryPolicy::github(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the breaker guarding the client.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker<C>> {
        &self.breaker
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, call: F) -> GitHubResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GitHubResult<T>>,
    {
        let result = self
            .breaker
            .execute(|| with_retry(self.policy, &call))
            .await
            .map_err(|error| match error {
                CircuitError::Open(open) => GitHubError::CircuitOpen(open),
                CircuitError::Operation(inner) => inner,
            });
        if let Err(error) = &result {
            tracing::warn!(operation, %error, "GitHub call failed");
        }
        result
    }
}

#[async_trait]
impl<C> GitHubClient for ResilientGitHubClient<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn list_pull_request_files(
        &self,
        repository: &Repository,
        number: u64,
    ) -> GitHubResult<Vec<ChangedFile>> {
        self.call("list_pull_request_files", || {
            self.inner.list_pull_request_files(repository, number)
        })
        .await
    }

    async fn list_open_pull_requests(
        &self,
        repository: &Repository,
    ) -> GitHubResult<Vec<PullRequest>> {
        self.call("list_open_pull_requests", || {
            self.inner.list_open_pull_requests(repository)
        })
        .await
    }

    async fn create_comment(
        &self,
        repository: &Repository,
        number: u64,
        body: &str,
    ) -> GitHubResult<()> {
        self.call("create_comment", || {
            self.inner.create_comment(repository, number, body)
        })
        .await
    }

    async fn add_labels(
        &self,
        repository: &Repository,
        number: u64,
        labels: &[String],
    ) -> GitHubResult<()> {
        self.call("add_labels", || self.inner.add_labels(repository, number, labels))
            .await
    }

    async fn set_commit_status(
        &self,
        repository: &Repository,
        sha: &str,
        status: &CommitStatus,
    ) -> GitHubResult<()> {
        self.call("set_commit_status", || {
            self.inner.set_commit_status(repository, sha, status)
        })
        .await
    }

    async fn search_issues(
        &self,
        repository: &Repository,
        query: &str,
    ) -> GitHubResult<Vec<Issue>> {
        self.call("search_issues", || self.inner.search_issues(repository, query))
            .await
    }

    async fn create_issue(&self, repository: &Repository, issue: &NewIssue) -> GitHubResult<u64> {
        self.call("create_issue", || self.inner.create_issue(repository, issue))
            .await
    }
}

/// AI service whose calls go through a breaker, retried on transient
/// failures.
pub struct ResilientAiService<C>
where
    C: Clock + Send + Sync,
{
    inner: Arc<dyn AiService>,
    breaker: Arc<CircuitBreaker<C>>,
    policy: RetryPolicy,
}

impl<C> ResilientAiService<C>
where
    C: Clock + Send + Sync,
{
    /// Decorates `inner` with `breaker` and the AI retry policy.
    #[must_use]
    pub fn new(inner: Arc<dyn AiService>, breaker: Arc<CircuitBreaker<C>>) -> Self {
        Self {
            inner,
            breaker,
            policy: RetryPolicy::ai(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the breaker guarding the service.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker<C>> {
        &self.breaker
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, call: F) -> AiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AiResult<T>>,
    {
        let result = self
            .breaker
            .execute(|| with_retry(self.policy, &call))
            .await
            .map_err(|error| match error {
                CircuitError::Open(open) => AiError::CircuitOpen(open),
                CircuitError::Operation(inner) => inner,
            });
        if let Err(error) = &result {
            tracing::warn!(operation, %error, "AI call failed");
        }
        result
    }
}

#[async_trait]
impl<C> AiService for ResilientAiService<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn analyze_pull_request(
        &self,
        pull_request: &PullRequest,
        files: &[ChangedFile],
    ) -> AiResult<PrAnalysis> {
        self.call("analyze_pull_request", || {
            self.inner.analyze_pull_request(pull_request, files)
        })
        .await
    }

    async fn analyze_issue(&self, issue: &Issue) -> AiResult<IssueInsights> {
        self.call("analyze_issue", || self.inner.analyze_issue(issue))
            .await
    }

    async fn generate_review_comment(
        &self,
        pull_request: &PullRequest,
        findings: &[Finding],
    ) -> AiResult<String> {
        self.call("generate_review_comment", || {
            self.inner.generate_review_comment(pull_request, findings)
        })
        .await
    }
}
