//! Scripted AI service.

use crate::delegation::domain::Finding;
use crate::workflow::{
    domain::{ChangedFile, Issue, PrAnalysis, PullRequest},
    ports::{AiError, AiResult, AiService, IssueInsights},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// AI service returning canned answers.
///
/// Without a scripted pull request analysis, or while marked unavailable,
/// every call fails with [`AiError::Unavailable`], which drives callers onto
/// their heuristic fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAi {
    state: Arc<Mutex<ScriptedAiState>>,
}

#[derive(Debug, Default)]
struct ScriptedAiState {
    pull_request_analysis: Option<PrAnalysis>,
    issue_insights: Option<IssueInsights>,
    review_comment: Option<String>,
    unavailable: bool,
    calls: usize,
}

impl ScriptedAi {
    /// Creates a service that answers nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the pull request analysis.
    #[must_use]
    pub fn with_pull_request_analysis(self, analysis: PrAnalysis) -> Self {
        self.lock().pull_request_analysis = Some(analysis);
        self
    }

    /// Scripts the issue insights.
    #[must_use]
    pub fn with_issue_insights(self, insights: IssueInsights) -> Self {
        self.lock().issue_insights = Some(insights);
        self
    }

    /// Scripts the review comment.
    #[must_use]
    pub fn with_review_comment(self, comment: impl Into<String>) -> Self {
        self.lock().review_comment = Some(comment.into());
        self
    }

    /// Makes every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedAiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn answer<T: Clone>(&self, pick: impl FnOnce(&ScriptedAiState) -> Option<T>) -> AiResult<T> {
        let mut state = self.lock();
        state.calls += 1;
        if state.unavailable {
            return Err(AiError::Unavailable("scripted outage".to_owned()));
        }
        pick(&state).ok_or_else(|| AiError::Unavailable("no scripted answer".to_owned()))
    }
}

#[async_trait]
impl AiService for ScriptedAi {
    async fn analyze_pull_request(
        &self,
        _pull_request: &PullRequest,
        _files: &[ChangedFile],
    ) -> AiResult<PrAnalysis> {
        self.answer(|state| state.pull_request_analysis.clone())
    }

    async fn analyze_issue(&self, _issue: &Issue) -> AiResult<IssueInsights> {
        self.answer(|state| state.issue_insights.clone())
    }

    async fn generate_review_comment(
        &self,
        _pull_request: &PullRequest,
        _findings: &[Finding],
    ) -> AiResult<String> {
        self.answer(|state| state.review_comment.clone())
    }
}
