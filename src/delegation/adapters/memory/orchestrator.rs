//! Scripted orchestrator for tests and dry-run replays.

use crate::delegation::{
    domain::{AgentType, DelegationContext, Task, TaskId, TaskOutput, TaskType},
    ports::{AgentPoolStatus, Orchestrator, OrchestratorError, OrchestratorResult, OrchestratorStatus},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scripted behaviour for one task type.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    /// Return the given output.
    Succeed(TaskOutput),
    /// Fail with the given message.
    Fail(String),
    /// Wait, then apply the inner outcome.
    Delayed(Duration, Box<ScriptedOutcome>),
}

/// In-memory orchestrator.
///
/// Task types without a script succeed with an empty output. Every call is
/// recorded so tests can assert on what was executed, paused, or cancelled.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrchestrator {
    state: Arc<Mutex<InMemoryOrchestratorState>>,
}

#[derive(Debug, Default)]
struct InMemoryOrchestratorState {
    scripts: HashMap<TaskType, ScriptedOutcome>,
    executed: Vec<Task>,
    paused: Vec<TaskId>,
    cancelled: Vec<TaskId>,
    in_flight: usize,
}

impl InMemoryOrchestrator {
    /// Creates an orchestrator where every task succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome for a task type, replacing any previous script.
    #[must_use]
    pub fn with_outcome(self, task_type: TaskType, outcome: ScriptedOutcome) -> Self {
        self.lock().scripts.insert(task_type, outcome);
        self
    }

    /// Returns every task handed to [`Orchestrator::execute_task`], in call
    /// order.
    #[must_use]
    pub fn executed(&self) -> Vec<Task> {
        self.lock().executed.clone()
    }

    /// Returns every task id passed to [`Orchestrator::pause_tasks`].
    #[must_use]
    pub fn paused(&self) -> Vec<TaskId> {
        self.lock().paused.clone()
    }

    /// Returns every task id passed to [`Orchestrator::cancel_task`].
    #[must_use]
    pub fn cancelled(&self) -> Vec<TaskId> {
        self.lock().cancelled.clone()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryOrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn execute_task(
        &self,
        task: &Task,
        _context: &DelegationContext,
    ) -> OrchestratorResult<TaskOutput> {
        let script = {
            let mut state = self.lock();
            state.executed.push(task.clone());
            state.in_flight += 1;
            state.scripts.get(&task.task_type()).cloned()
        };

        let mut outcome = script.unwrap_or_else(|| {
            ScriptedOutcome::Succeed(TaskOutput::with_summary(format!(
                "{} finished",
                task.task_type()
            )))
        });
        let result = loop {
            match outcome {
                ScriptedOutcome::Succeed(output) => break Ok(output),
                ScriptedOutcome::Fail(message) => break Err(OrchestratorError::Execution(message)),
                ScriptedOutcome::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    outcome = *inner;
                }
            }
        };

        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        result
    }

    async fn pause_tasks(&self, task_ids: &[TaskId]) -> OrchestratorResult<()> {
        self.lock().paused.extend_from_slice(task_ids);
        Ok(())
    }

    async fn cancel_task(&self, task_id: TaskId) -> OrchestratorResult<()> {
        self.lock().cancelled.push(task_id);
        Ok(())
    }

    async fn system_status(&self) -> OrchestratorResult<OrchestratorStatus> {
        let state = self.lock();
        let pools = AgentType::ALL
            .into_iter()
            .map(|agent_type| AgentPoolStatus {
                agent_type,
                available: 1,
                busy: 0,
            })
            .collect();
        Ok(OrchestratorStatus {
            active_tasks: state.in_flight,
            completed_tasks: state.executed.len().saturating_sub(state.in_flight),
            pools,
        })
    }
}
