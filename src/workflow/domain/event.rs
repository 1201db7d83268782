//! Typed webhook events parsed from GitHub payloads.

use super::{Comment, Issue, PullRequest, Repository, WorkflowDomainError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Pull request webhook actions the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    /// A pull request was opened.
    Opened,
    /// New commits were pushed.
    Synchronize,
    /// A draft was marked ready.
    ReadyForReview,
    /// The pull request was closed or merged.
    Closed,
    /// The pull request went back to draft.
    ConvertedToDraft,
    /// Any other action.
    Other(String),
}

impl From<&str> for PullRequestAction {
    fn from(action: &str) -> Self {
        match action {
            "opened" => Self::Opened,
            "synchronize" => Self::Synchronize,
            "ready_for_review" => Self::ReadyForReview,
            "closed" => Self::Closed,
            "converted_to_draft" => Self::ConvertedToDraft,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Issue webhook actions the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueAction {
    /// An issue was opened.
    Opened,
    /// Title or body changed.
    Edited,
    /// The issue was closed.
    Closed,
    /// The issue was reopened.
    Reopened,
    /// Any other action.
    Other(String),
}

impl From<&str> for IssueAction {
    fn from(action: &str) -> Self {
        match action {
            "opened" => Self::Opened,
            "edited" => Self::Edited,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Webhook event routed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `pull_request` event.
    PullRequest {
        /// Event action.
        action: PullRequestAction,
        /// Affected pull request.
        pull_request: PullRequest,
        /// Owning repository.
        repository: Repository,
    },
    /// `issues` event.
    Issue {
        /// Event action.
        action: IssueAction,
        /// Affected issue.
        issue: Issue,
        /// Owning repository.
        repository: Repository,
    },
    /// Newly created `issue_comment`.
    Comment {
        /// Issue or pull request commented on.
        issue: Issue,
        /// The new comment.
        comment: Comment,
        /// Owning repository.
        repository: Repository,
        /// Whether the comment is on a pull request.
        on_pull_request: bool,
    },
    /// `ping` sent when a hook is installed.
    Ping,
    /// Event the engine does not handle.
    Ignored {
        /// Event name.
        event: String,
        /// Action, when present.
        action: Option<String>,
    },
}

impl WebhookEvent {
    /// Parses a payload delivered under the `X-GitHub-Event` name `event`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::MalformedPayload`] when a handled
    /// event lacks required fields, or
    /// [`WorkflowDomainError::InvalidRepository`] when the repository name
    /// is not `owner/name`.
    pub fn parse(event: &str, payload: &Value) -> Result<Self, WorkflowDomainError> {
        match event {
            "pull_request" => {
                let wire: WirePullRequestEvent = decode(event, payload)?;
                Ok(Self::PullRequest {
                    action: PullRequestAction::from(wire.action.as_str()),
                    pull_request: wire.pull_request.into(),
                    repository: Repository::parse(&wire.repository.full_name)?,
                })
            }
            "issues" => {
                let wire: WireIssueEvent = decode(event, payload)?;
                Ok(Self::Issue {
                    action: IssueAction::from(wire.action.as_str()),
                    issue: wire.issue.into(),
                    repository: Repository::parse(&wire.repository.full_name)?,
                })
            }
            "issue_comment" => {
                let wire: WireCommentEvent = decode(event, payload)?;
                if wire.action != "created" {
                    return Ok(Self::Ignored {
                        event: event.to_owned(),
                        action: Some(wire.action),
                    });
                }
                let on_pull_request = wire.issue.pull_request.is_some();
                Ok(Self::Comment {
                    issue: wire.issue.into(),
                    comment: wire.comment.into(),
                    repository: Repository::parse(&wire.repository.full_name)?,
                    on_pull_request,
                })
            }
            "ping" => Ok(Self::Ping),
            other => Ok(Self::Ignored {
                event: other.to_owned(),
                action: payload
                    .get("action")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(event: &str, payload: &Value) -> Result<T, WorkflowDomainError> {
    T::deserialize(payload).map_err(|error| WorkflowDomainError::MalformedPayload {
        event: event.to_owned(),
        reason: error.to_string(),
    })
}

#[derive(Deserialize)]
struct WireRepository {
    full_name: String,
}

#[derive(Deserialize)]
struct WireUser {
    login: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl WireUser {
    fn is_bot(&self) -> bool {
        self.kind.as_deref() == Some("Bot") || self.login.ends_with("[bot]")
    }
}

#[derive(Deserialize)]
struct WireLabel {
    name: String,
}

#[derive(Deserialize)]
struct WireRef {
    sha: String,
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct WirePullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: WireUser,
    head: WireRef,
    base: WireRef,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    labels: Vec<WireLabel>,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

impl From<WirePullRequest> for PullRequest {
    fn from(wire: WirePullRequest) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            body: wire.body.unwrap_or_default(),
            author: wire.user.login,
            head_sha: wire.head.sha,
            head_ref: wire.head.name,
            base_ref: wire.base.name,
            draft: wire.draft,
            labels: wire.labels.into_iter().map(|label| label.name).collect(),
            additions: wire.additions,
            deletions: wire.deletions,
        }
    }
}

#[derive(Deserialize)]
struct WireIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: WireUser,
    #[serde(default)]
    labels: Vec<WireLabel>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    pull_request: Option<Value>,
}

impl From<WireIssue> for Issue {
    fn from(wire: WireIssue) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            body: wire.body.unwrap_or_default(),
            author: wire.user.login,
            labels: wire.labels.into_iter().map(|label| label.name).collect(),
            open: wire.state.as_deref() != Some("closed"),
        }
    }
}

#[derive(Deserialize)]
struct WireComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    user: WireUser,
}

impl From<WireComment> for Comment {
    fn from(wire: WireComment) -> Self {
        let author_is_bot = wire.user.is_bot();
        Self {
            id: wire.id,
            body: wire.body.unwrap_or_default(),
            author: wire.user.login,
            author_is_bot,
        }
    }
}

#[derive(Deserialize)]
struct WirePullRequestEvent {
    action: String,
    pull_request: WirePullRequest,
    repository: WireRepository,
}

#[derive(Deserialize)]
struct WireIssueEvent {
    action: String,
    issue: WireIssue,
    repository: WireRepository,
}

#[derive(Deserialize)]
struct WireCommentEvent {
    action: String,
    issue: WireIssue,
    comment: WireComment,
    repository: WireRepository,
}
