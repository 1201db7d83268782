//! Repository, pull request, issue, and comment values.

use super::WorkflowDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    /// Creates a repository reference.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses an `owner/name` full name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidRepository`] unless the value
    /// holds exactly two non-empty, slash-separated segments.
    pub fn parse(full_name: &str) -> Result<Self, WorkflowDomainError> {
        let trimmed = full_name.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(WorkflowDomainError::InvalidRepository(full_name.to_owned())),
        }
    }

    /// Returns the owning account.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Pull request fields the workflow reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description, empty when absent.
    pub body: String,
    /// Author login.
    pub author: String,
    /// Head commit SHA used for commit statuses.
    pub head_sha: String,
    /// Head branch name.
    pub head_ref: String,
    /// Base branch name.
    pub base_ref: String,
    /// Whether the pull request is a draft.
    pub draft: bool,
    /// Label names.
    pub labels: Vec<String>,
    /// Added lines.
    pub additions: u64,
    /// Deleted lines.
    pub deletions: u64,
}

impl PullRequest {
    /// Creates a non-draft pull request with empty metadata.
    #[must_use]
    pub fn new(number: u64, title: impl Into<String>, head_sha: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: String::new(),
            author: String::new(),
            head_sha: head_sha.into(),
            head_ref: String::new(),
            base_ref: String::new(),
            draft: false,
            labels: Vec::new(),
            additions: 0,
            deletions: 0,
        }
    }
}

/// One file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// GitHub change status (`added`, `modified`, `removed`, ...).
    pub status: String,
    /// Added lines.
    pub additions: u64,
    /// Deleted lines.
    pub deletions: u64,
}

impl ChangedFile {
    /// Creates a modified file entry.
    #[must_use]
    pub fn modified(filename: impl Into<String>, additions: u64, deletions: u64) -> Self {
        Self {
            filename: filename.into(),
            status: "modified".to_owned(),
            additions,
            deletions,
        }
    }

    /// Returns added plus deleted lines.
    #[must_use]
    pub const fn changes(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

/// Issue fields the workflow reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description, empty when absent.
    pub body: String,
    /// Author login.
    pub author: String,
    /// Label names.
    pub labels: Vec<String>,
    /// Whether the issue is open.
    pub open: bool,
}

impl Issue {
    /// Creates an open, unlabelled issue.
    #[must_use]
    pub fn new(number: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            author: String::new(),
            labels: Vec::new(),
            open: true,
        }
    }

    /// Returns title and body joined for classification.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// Comment posted on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: u64,
    /// Markdown body.
    pub body: String,
    /// Author login.
    pub author: String,
    /// Whether the author is a bot account.
    pub author_is_bot: bool,
}

impl Comment {
    /// Creates a comment by a human author.
    #[must_use]
    pub fn new(id: u64, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
            author: author.into(),
            author_is_bot: false,
        }
    }
}
