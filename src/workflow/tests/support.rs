//! Shared wiring for workflow service tests.

use std::sync::Arc;

use crate::delegation::{adapters::memory::InMemoryOrchestrator, services::TaskDelegator};
use crate::runtime::{adapters::memory::InMemoryAgentToggle, services::ShutdownHandle};
use crate::workflow::{
    adapters::memory::{InMemoryGitHub, ScriptedAi},
    domain::Repository,
    services::{IssueWorkflowService, PrWorkflowService, WebhookRouter, WorkflowDeps},
};
use mockable::DefaultClock;

pub(super) struct Harness {
    pub(super) github: InMemoryGitHub,
    pub(super) ai: ScriptedAi,
    pub(super) orchestrator: InMemoryOrchestrator,
    pub(super) agents: Arc<InMemoryAgentToggle>,
}

impl Harness {
    pub(super) fn new(github: InMemoryGitHub, ai: ScriptedAi, orchestrator: InMemoryOrchestrator) -> Self {
        Self {
            github,
            ai,
            orchestrator,
            agents: Arc::new(InMemoryAgentToggle::default()),
        }
    }

    pub(super) fn deps(&self) -> WorkflowDeps<DefaultClock> {
        let clock = Arc::new(DefaultClock);
        WorkflowDeps {
            github: Arc::new(self.github.clone()),
            ai: Arc::new(self.ai.clone()),
            delegator: Arc::new(TaskDelegator::new(
                Arc::new(self.orchestrator.clone()),
                Arc::clone(&clock),
            )),
            agents: self.agents.clone(),
            clock,
        }
    }

    pub(super) fn pull_requests(&self, shutdown: ShutdownHandle) -> PrWorkflowService<DefaultClock> {
        PrWorkflowService::new(self.deps(), shutdown)
    }

    pub(super) fn issues(&self) -> IssueWorkflowService<DefaultClock> {
        IssueWorkflowService::new(self.deps())
    }

    pub(super) fn router(&self) -> WebhookRouter<DefaultClock> {
        WebhookRouter::new(
            Arc::new(self.pull_requests(ShutdownHandle::detached())),
            Arc::new(self.issues()),
        )
    }
}

pub(super) fn repository() -> Repository {
    Repository::new("acme", "widgets")
}
