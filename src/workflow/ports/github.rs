//! GitHub REST port.

use crate::resilience::domain::{BreakerOpen, DependencyError};
use crate::workflow::domain::{ChangedFile, Issue, PullRequest, Repository};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// GitHub operations used by the workflows.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Lists files changed by a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn list_pull_request_files(
        &self,
        repository: &Repository,
        number: u64,
    ) -> GitHubResult<Vec<ChangedFile>>;

    /// Lists open pull requests.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn list_open_pull_requests(
        &self,
        repository: &Repository,
    ) -> GitHubResult<Vec<PullRequest>>;

    /// Posts a comment on an issue or pull request.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn create_comment(
        &self,
        repository: &Repository,
        number: u64,
        body: &str,
    ) -> GitHubResult<()>;

    /// Adds labels to an issue or pull request.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn add_labels(
        &self,
        repository: &Repository,
        number: u64,
        labels: &[String],
    ) -> GitHubResult<()>;

    /// Sets a commit status on `sha`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn set_commit_status(
        &self,
        repository: &Repository,
        sha: &str,
        status: &CommitStatus,
    ) -> GitHubResult<()>;

    /// Searches open issues of the repository matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn search_issues(&self, repository: &Repository, query: &str)
    -> GitHubResult<Vec<Issue>>;

    /// Opens an issue and returns its number.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the request fails.
    async fn create_issue(&self, repository: &Repository, issue: &NewIssue) -> GitHubResult<u64>;
}

/// Commit status state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// Checks are running.
    Pending,
    /// Checks passed.
    Success,
    /// Checks found problems.
    Failure,
    /// Checks could not run.
    Error,
}

/// Commit status payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    /// Status state.
    pub state: CommitState,
    /// Status context name shown in the checks list.
    pub context: String,
    /// Short description.
    pub description: String,
}

impl CommitStatus {
    /// Creates a status under the engine's context name.
    #[must_use]
    pub fn new(state: CommitState, description: impl Into<String>) -> Self {
        Self {
            state,
            context: "forgewatch".to_owned(),
            description: description.into(),
        }
    }
}

/// Issue to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    /// Title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Initial labels.
    pub labels: Vec<String>,
}

/// Errors returned by GitHub clients.
#[derive(Debug, Clone, Error)]
pub enum GitHubError {
    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API rate limit was hit.
    #[error("rate limited")]
    RateLimited,

    /// The API returned an error response.
    #[error("GitHub API error {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Response message.
        message: String,
    },

    /// The GitHub breaker rejected the call.
    #[error(transparent)]
    CircuitOpen(BreakerOpen),

    /// Transport failure.
    #[error("GitHub transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl GitHubError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

impl DependencyError for GitHubError {
    fn code(&self) -> Option<&str> {
        match self {
            Self::NotFound(_) => Some("not_found"),
            Self::RateLimited => Some("rate_limited"),
            Self::Api { .. } => Some("api_error"),
            Self::CircuitOpen(_) => Some("circuit_open"),
            Self::Transport(_) => None,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::NotFound(_) | Self::CircuitOpen(_) => false,
        }
    }
}
