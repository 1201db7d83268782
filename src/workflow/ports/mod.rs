//! Port contracts for the forge and the AI service.

mod ai;
mod github;

pub use ai::{AiError, AiResult, AiService, IssueInsights};
pub use github::{CommitState, CommitStatus, GitHubClient, GitHubError, GitHubResult, NewIssue};
