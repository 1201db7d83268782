//! Orchestrator port executing single tasks against agent capabilities.

use crate::delegation::domain::{AgentType, DelegationContext, Task, TaskId, TaskOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Task execution contract.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Executes one task on the capability pool named by the task.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the agent rejects or fails the task.
    async fn execute_task(
        &self,
        task: &Task,
        context: &DelegationContext,
    ) -> OrchestratorResult<TaskOutput>;

    /// Requests that the given tasks pause.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the request cannot be delivered.
    async fn pause_tasks(&self, task_ids: &[TaskId]) -> OrchestratorResult<()>;

    /// Requests that a task be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the request cannot be delivered.
    async fn cancel_task(&self, task_id: TaskId) -> OrchestratorResult<()>;

    /// Reports capability pool load.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the status cannot be retrieved.
    async fn system_status(&self) -> OrchestratorResult<OrchestratorStatus>;
}

/// Load of one capability pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPoolStatus {
    /// Capability pool.
    pub agent_type: AgentType,
    /// Idle agents.
    pub available: usize,
    /// Agents currently executing tasks.
    pub busy: usize,
}

/// Orchestrator-wide status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Tasks currently executing.
    pub active_tasks: usize,
    /// Tasks executed since start.
    pub completed_tasks: usize,
    /// Per-pool load.
    pub pools: Vec<AgentPoolStatus>,
}

/// Errors returned by orchestrator implementations.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// No agent of the required capability is available.
    #[error("no {0} agent available")]
    AgentUnavailable(AgentType),

    /// The task is unknown to the orchestrator.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// The agent ran and reported a failure.
    #[error("agent execution failed: {0}")]
    Execution(String),

    /// Transport or runtime failure.
    #[error("orchestrator runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl OrchestratorError {
    /// Wraps a runtime error.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
