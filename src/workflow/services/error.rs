//! Service-level workflow errors.

use crate::workflow::{
    domain::{ContextKey, WorkflowDomainError},
    ports::GitHubError,
};
use thiserror::Error;

/// Errors raised inside a workflow pipeline.
///
/// Pipelines catch these at their entry point, log them, and report them on
/// the pull request or issue; they never reach the webhook caller.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// A GitHub call failed after retries, or its breaker is open.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// Building or rendering a domain value failed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),

    /// No live context exists for the key.
    #[error("no context recorded for {0}")]
    MissingContext(ContextKey),
}

/// Result type for workflow pipelines.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
