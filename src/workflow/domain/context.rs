//! Per-entity workflow contexts and their keyed store.

use super::{IssueAnalysis, PrAnalysis, PullRequest, Repository, Issue};
use crate::delegation::domain::AgentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// `owner/name#number` key shared by pull requests and issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(String);

impl ContextKey {
    /// Builds the key for an entity in `repository`.
    #[must_use]
    pub fn new(repository: &Repository, number: u64) -> Self {
        Self(format!("{repository}#{number}"))
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyed store holding at most one live record per key.
#[derive(Debug)]
pub struct ContextStore<T> {
    records: Mutex<HashMap<ContextKey, T>>,
}

impl<T> Default for ContextStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ContextStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `key`.
    pub fn insert(&self, key: ContextKey, record: T) {
        self.lock().insert(key, record);
    }

    /// Returns a copy of the record for `key`.
    #[must_use]
    pub fn get(&self, key: &ContextKey) -> Option<T> {
        self.lock().get(key).cloned()
    }

    /// Returns whether a record exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &ContextKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Mutates the record for `key` in place, if present.
    pub fn update(&self, key: &ContextKey, mutate: impl FnOnce(&mut T)) {
        if let Some(record) = self.lock().get_mut(key) {
            mutate(record);
        }
    }

    /// Removes and returns the record for `key`.
    #[must_use]
    pub fn remove(&self, key: &ContextKey) -> Option<T> {
        self.lock().remove(key)
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContextKey, T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pull request processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    /// Analysis and delegation are running.
    Processing,
    /// The final report was posted.
    Completed,
    /// The pipeline failed; an error comment was posted.
    Failed,
}

impl PrStatus {
    /// Returns the lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live state of one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrContext {
    /// Store key.
    pub key: ContextKey,
    /// Pull request as last seen.
    pub pull_request: PullRequest,
    /// Owning repository.
    pub repository: Repository,
    /// Latest analysis.
    pub analysis: PrAnalysis,
    /// Processing status.
    pub status: PrStatus,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
    /// Report summary once completed.
    pub summary: Option<String>,
}

impl PrContext {
    /// Creates a context in the `processing` state.
    #[must_use]
    pub fn processing(
        pull_request: PullRequest,
        repository: Repository,
        analysis: PrAnalysis,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ContextKey::new(&repository, pull_request.number),
            pull_request,
            repository,
            analysis,
            status: PrStatus::Processing,
            updated_at: now,
            summary: None,
        }
    }

    /// Moves a processing context to a terminal status.
    ///
    /// Returns `false` and leaves the context untouched when it has
    /// already settled.
    pub fn settle(&mut self, status: PrStatus, now: DateTime<Utc>) -> bool {
        if self.status != PrStatus::Processing || status == PrStatus::Processing {
            return false;
        }
        self.status = status;
        self.updated_at = now;
        true
    }
}

/// Issue lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Analysed, not yet triaged.
    New,
    /// Labels and triage comment posted.
    Triaged,
    /// Work delegated or an agent assigned.
    Assigned,
    /// Closed upstream.
    Closed,
}

impl IssueStatus {
    /// Returns the lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Triaged => "triaged",
            Self::Assigned => "assigned",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live state of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueContext {
    /// Store key.
    pub key: ContextKey,
    /// Issue as last seen.
    pub issue: Issue,
    /// Owning repository.
    pub repository: Repository,
    /// Latest classification.
    pub analysis: IssueAnalysis,
    /// Lifecycle status.
    pub status: IssueStatus,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
    /// Capability pool assigned by command or task generation.
    pub assigned_agent: Option<AgentType>,
    /// Linked pull request numbers.
    pub linked_pull_requests: Vec<u64>,
    /// Issue this one duplicates, when marked.
    pub duplicate_of: Option<u64>,
}

impl IssueContext {
    /// Creates a context in the `new` state.
    #[must_use]
    pub fn new(
        issue: Issue,
        repository: Repository,
        analysis: IssueAnalysis,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ContextKey::new(&repository, issue.number),
            issue,
            repository,
            analysis,
            status: IssueStatus::New,
            updated_at: now,
            assigned_agent: None,
            linked_pull_requests: Vec::new(),
            duplicate_of: None,
        }
    }

    /// Moves the context forward to `status`.
    ///
    /// Backward moves are ignored and return `false`.
    pub fn advance(&mut self, status: IssueStatus, now: DateTime<Utc>) -> bool {
        if status <= self.status {
            return false;
        }
        self.status = status;
        self.updated_at = now;
        true
    }
}
