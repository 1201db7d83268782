//! Recording GitHub client.

use crate::workflow::{
    domain::{ChangedFile, Issue, PullRequest, Repository},
    ports::{CommitStatus, GitHubClient, GitHubError, GitHubResult, NewIssue},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const FIRST_CREATED_ISSUE: u64 = 1_000;

/// Comment recorded by [`InMemoryGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    /// Issue or pull request number.
    pub number: u64,
    /// Comment body.
    pub body: String,
}

/// In-memory GitHub client.
///
/// Seeded files, pull requests, and issues are served back; every write is
/// recorded. Queued failures are returned by the next calls in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGitHub {
    state: Arc<Mutex<InMemoryGitHubState>>,
}

#[derive(Debug, Default)]
struct InMemoryGitHubState {
    files: HashMap<u64, Vec<ChangedFile>>,
    open_pull_requests: Vec<PullRequest>,
    issues: Vec<Issue>,
    comments: Vec<PostedComment>,
    labels: BTreeMap<u64, Vec<String>>,
    label_requests: Vec<(u64, Vec<String>)>,
    statuses: Vec<(String, CommitStatus)>,
    created_issues: Vec<NewIssue>,
    failures: VecDeque<GitHubError>,
    calls: usize,
}

impl InMemoryGitHub {
    /// Creates an empty forge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the changed files of a pull request.
    #[must_use]
    pub fn with_files(self, number: u64, files: Vec<ChangedFile>) -> Self {
        self.lock().files.insert(number, files);
        self
    }

    /// Seeds an open pull request.
    #[must_use]
    pub fn with_open_pull_request(self, pull_request: PullRequest) -> Self {
        self.lock().open_pull_requests.push(pull_request);
        self
    }

    /// Seeds an issue visible to search.
    #[must_use]
    pub fn with_issue(self, issue: Issue) -> Self {
        self.lock().issues.push(issue);
        self
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: GitHubError) {
        self.lock().failures.push_back(error);
    }

    /// Returns every posted comment in order.
    #[must_use]
    pub fn comments(&self) -> Vec<PostedComment> {
        self.lock().comments.clone()
    }

    /// Returns the comment bodies posted on `number`.
    #[must_use]
    pub fn comments_on(&self, number: u64) -> Vec<String> {
        self.lock()
            .comments
            .iter()
            .filter(|comment| comment.number == number)
            .map(|comment| comment.body.clone())
            .collect()
    }

    /// Returns the labels added to `number`.
    #[must_use]
    pub fn labels_on(&self, number: u64) -> Vec<String> {
        self.lock().labels.get(&number).cloned().unwrap_or_default()
    }

    /// Returns each label batch requested for `number`, duplicates included.
    #[must_use]
    pub fn label_requests_on(&self, number: u64) -> Vec<Vec<String>> {
        self.lock()
            .label_requests
            .iter()
            .filter(|(target, _)| *target == number)
            .map(|(_, labels)| labels.clone())
            .collect()
    }

    /// Returns every commit status set, with its SHA.
    #[must_use]
    pub fn statuses(&self) -> Vec<(String, CommitStatus)> {
        self.lock().statuses.clone()
    }

    /// Returns every issue opened through the client.
    #[must_use]
    pub fn created_issues(&self) -> Vec<NewIssue> {
        self.lock().created_issues.clone()
    }

    /// Returns the number of calls received, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryGitHubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<MutexGuard<'_, InMemoryGitHubState>, GitHubError> {
        let mut state = self.lock();
        state.calls += 1;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        Ok(state)
    }
}

fn search_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() > 2)
        .collect()
}

#[async_trait]
impl GitHubClient for InMemoryGitHub {
    async fn list_pull_request_files(
        &self,
        _repository: &Repository,
        number: u64,
    ) -> GitHubResult<Vec<ChangedFile>> {
        let state = self.begin()?;
        Ok(state.files.get(&number).cloned().unwrap_or_default())
    }

    async fn list_open_pull_requests(
        &self,
        _repository: &Repository,
    ) -> GitHubResult<Vec<PullRequest>> {
        Ok(self.begin()?.open_pull_requests.clone())
    }

    async fn create_comment(
        &self,
        _repository: &Repository,
        number: u64,
        body: &str,
    ) -> GitHubResult<()> {
        self.begin()?.comments.push(PostedComment {
            number,
            body: body.to_owned(),
        });
        Ok(())
    }

    async fn add_labels(
        &self,
        _repository: &Repository,
        number: u64,
        labels: &[String],
    ) -> GitHubResult<()> {
        let mut state = self.begin()?;
        state.label_requests.push((number, labels.to_vec()));
        let applied = state.labels.entry(number).or_default();
        for label in labels {
            if !applied.contains(label) {
                applied.push(label.clone());
            }
        }
        Ok(())
    }

    async fn set_commit_status(
        &self,
        _repository: &Repository,
        sha: &str,
        status: &CommitStatus,
    ) -> GitHubResult<()> {
        self.begin()?
            .statuses
            .push((sha.to_owned(), status.clone()));
        Ok(())
    }

    async fn search_issues(
        &self,
        _repository: &Repository,
        query: &str,
    ) -> GitHubResult<Vec<Issue>> {
        let terms = search_terms(query);
        let state = self.begin()?;
        Ok(state
            .issues
            .iter()
            .filter(|issue| issue.open)
            .filter(|issue| {
                let title = issue.title.to_lowercase();
                terms.iter().any(|term| title.contains(term.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn create_issue(&self, _repository: &Repository, issue: &NewIssue) -> GitHubResult<u64> {
        let mut state = self.begin()?;
        state.created_issues.push(issue.clone());
        let offset = u64::try_from(state.created_issues.len()).unwrap_or(u64::MAX);
        Ok(FIRST_CREATED_ISSUE.saturating_add(offset))
    }
}
