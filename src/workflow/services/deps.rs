//! Collaborators shared by the workflow engines.

use crate::delegation::services::TaskDelegator;
use crate::runtime::ports::AgentToggle;
use crate::workflow::ports::{AiService, GitHubClient};
use mockable::Clock;
use std::sync::Arc;

/// Ports and services the workflow engines call into.
pub struct WorkflowDeps<C>
where
    C: Clock + Send + Sync,
{
    /// Forge client, usually resilient.
    pub github: Arc<dyn GitHubClient>,
    /// AI service, usually resilient.
    pub ai: Arc<dyn AiService>,
    /// Task delegator shared by both engines.
    pub delegator: Arc<TaskDelegator<C>>,
    /// Global switch for agent work.
    pub agents: Arc<dyn AgentToggle>,
    /// Time source for context timestamps.
    pub clock: Arc<C>,
}

impl<C> Clone for WorkflowDeps<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            github: Arc::clone(&self.github),
            ai: Arc::clone(&self.ai),
            delegator: Arc::clone(&self.delegator),
            agents: Arc::clone(&self.agents),
            clock: Arc::clone(&self.clock),
        }
    }
}
