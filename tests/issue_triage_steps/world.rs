//! Shared world state for issue triage BDD scenarios.

use std::sync::Arc;

use forgewatch::delegation::{adapters::memory::InMemoryOrchestrator, services::TaskDelegator};
use forgewatch::runtime::adapters::memory::InMemoryAgentToggle;
use forgewatch::workflow::{
    adapters::memory::{InMemoryGitHub, ScriptedAi},
    domain::{Issue, IssueStatus, Repository},
    services::{IssueWorkflowService, WorkflowDeps},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Scenario world for issue triage behaviour tests.
pub struct TriageWorld {
    pub github: InMemoryGitHub,
    pub repository: Repository,
    pub pending_issue: Option<Issue>,
    pub status: Option<IssueStatus>,
}

/// Number given to the issue under test.
pub const ISSUE_NUMBER: u64 = 42;

impl TriageWorld {
    /// Creates a world over an empty forge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            github: InMemoryGitHub::new(),
            repository: Repository::new("acme", "widgets"),
            pending_issue: None,
            status: None,
        }
    }

    /// Builds the issue engine over the current forge state.
    #[must_use]
    pub fn service(&self) -> IssueWorkflowService<DefaultClock> {
        let clock = Arc::new(DefaultClock);
        IssueWorkflowService::new(WorkflowDeps {
            github: Arc::new(self.github.clone()),
            ai: Arc::new(ScriptedAi::new()),
            delegator: Arc::new(TaskDelegator::new(
                Arc::new(InMemoryOrchestrator::new()),
                Arc::clone(&clock),
            )),
            agents: Arc::new(InMemoryAgentToggle::new(true)),
            clock,
        })
    }
}

impl Default for TriageWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TriageWorld {
    TriageWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
