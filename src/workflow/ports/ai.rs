//! AI analysis port.

use crate::delegation::domain::Finding;
use crate::resilience::domain::{BreakerOpen, DependencyError};
use crate::workflow::domain::{ChangedFile, Issue, PrAnalysis, PullRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for AI operations.
pub type AiResult<T> = Result<T, AiError>;

/// AI-assisted analysis used when available.
///
/// Callers fall back to local heuristics whenever these calls fail.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Derives review requirements for a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] when the service fails or answers nonsense.
    async fn analyze_pull_request(
        &self,
        pull_request: &PullRequest,
        files: &[ChangedFile],
    ) -> AiResult<PrAnalysis>;

    /// Suggests how to approach an issue.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] when the service fails or answers nonsense.
    async fn analyze_issue(&self, issue: &Issue) -> AiResult<IssueInsights>;

    /// Writes review prose for code review findings.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] when the service fails or answers nonsense.
    async fn generate_review_comment(
        &self,
        pull_request: &PullRequest,
        findings: &[Finding],
    ) -> AiResult<String>;
}

/// AI suggestions for an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInsights {
    /// Implementation steps replacing the default approach when non-empty.
    pub suggested_approach: Vec<String>,
}

/// Errors returned by AI services.
#[derive(Debug, Clone, Error)]
pub enum AiError {
    /// The service is down or overloaded.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    /// The response could not be interpreted.
    #[error("invalid AI response: {0}")]
    InvalidResponse(String),

    /// The AI breaker rejected the call.
    #[error(transparent)]
    CircuitOpen(BreakerOpen),

    /// Transport failure.
    #[error("AI transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl AiError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

impl DependencyError for AiError {
    fn code(&self) -> Option<&str> {
        match self {
            Self::Unavailable(_) => Some("unavailable"),
            Self::InvalidResponse(_) => Some("invalid_response"),
            Self::CircuitOpen(_) => Some("circuit_open"),
            Self::Transport(_) => None,
        }
    }

    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Transport(_))
    }
}
