//! Priority-grouped, deadline-bounded task delegation.

use crate::delegation::{
    domain::{DelegationContext, Task, TaskEvent, TaskId, TaskPriority, TaskResult},
    ports::{Orchestrator, OrchestratorResult, OrchestratorStatus},
};
use futures::future::join_all;
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Why a task stopped being tracked before it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Paused,
    Cancelled,
}

impl StopReason {
    const fn message(self) -> &'static str {
        match self {
            Self::Paused => "task paused",
            Self::Cancelled => "task cancelled",
        }
    }
}

#[derive(Debug, Default)]
struct Bookkeeping {
    active: HashMap<TaskId, String>,
    stopped: HashMap<TaskId, StopReason>,
}

/// Delegates tasks to the orchestrator.
///
/// Every delegation settles into exactly one [`TaskResult`]; orchestrator
/// failures, timeouts, and local stops become failed results rather than
/// errors.
pub struct TaskDelegator<C>
where
    C: Clock + Send + Sync,
{
    orchestrator: Arc<dyn Orchestrator>,
    clock: Arc<C>,
    bookkeeping: Mutex<Bookkeeping>,
    events: broadcast::Sender<TaskEvent>,
}

impl<C> TaskDelegator<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a delegator over the given orchestrator.
    #[must_use]
    pub fn new(orchestrator: Arc<dyn Orchestrator>, clock: Arc<C>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            orchestrator,
            clock,
            bookkeeping: Mutex::new(Bookkeeping::default()),
            events,
        }
    }

    /// Subscribes to task lifecycle notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Runs one task against its deadline.
    ///
    /// The orchestrator call is raced against `task.timeout()`; the timer is
    /// dropped as soon as either side settles.
    pub async fn delegate_task(&self, task: Task, context: &DelegationContext) -> TaskResult {
        let started_at = self.clock.utc();
        self.track(&task, context);
        self.publish(TaskEvent::Started {
            task_id: task.id(),
            task_type: task.task_type(),
            correlation_id: context.correlation_id().to_owned(),
        });
        tracing::debug!(
            task_id = %task.id(),
            task_type = %task.task_type(),
            priority = %task.priority(),
            agent = %task.agent_type(),
            correlation = context.correlation_id(),
            "delegating task"
        );

        let outcome =
            tokio::time::timeout(task.timeout(), self.orchestrator.execute_task(&task, context))
                .await;
        let stopped = self.untrack(task.id());
        let completed_at = self.clock.utc();

        let result = match (stopped, outcome) {
            (Some(reason), _) => TaskResult::failed(task, reason.message(), started_at, completed_at),
            (None, Ok(Ok(output))) => TaskResult::completed(task, output, started_at, completed_at),
            (None, Ok(Err(error))) => {
                TaskResult::failed(task, error.to_string(), started_at, completed_at)
            }
            (None, Err(_elapsed)) => {
                let message = format!(
                    "task timed out after {}ms",
                    task.timeout().as_millis()
                );
                TaskResult::failed(task, message, started_at, completed_at)
            }
        };

        self.report(&result, context);
        result
    }

    /// Runs tasks bucket by bucket in priority order.
    ///
    /// Tasks sharing a priority run concurrently and the whole bucket settles
    /// before the next one starts. When a critical task fails, no further
    /// buckets start and their tasks are absent from the returned results.
    pub async fn delegate_tasks(
        &self,
        tasks: Vec<Task>,
        context: &DelegationContext,
    ) -> Vec<TaskResult> {
        let mut buckets: BTreeMap<TaskPriority, Vec<Task>> = BTreeMap::new();
        for task in tasks {
            buckets.entry(task.priority()).or_default().push(task);
        }

        let mut results = Vec::new();
        for (priority, bucket) in buckets {
            let settled = join_all(
                bucket
                    .into_iter()
                    .map(|task| self.delegate_task(task, context)),
            )
            .await;
            let halt = settled.iter().any(TaskResult::is_critical_failure);
            results.extend(settled);

            if halt {
                tracing::warn!(
                    correlation = context.correlation_id(),
                    %priority,
                    "critical task failed, skipping remaining priority buckets"
                );
                break;
            }
        }
        results
    }

    /// Re-delegates a derived copy of `task` with a fresh id and one retry
    /// fewer.
    pub async fn retry_task(&self, task: &Task, context: &DelegationContext) -> TaskResult {
        let retry = task.derive_retry();
        tracing::info!(
            original = %task.id(),
            retry = %retry.id(),
            retries_left = retry.retries(),
            "retrying task"
        );
        self.delegate_task(retry, context).await
    }

    /// Pauses tasks and stops tracking them locally.
    ///
    /// In-flight orchestrator work is not aborted; when it settles the
    /// result is reported as failed.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator error when the pause request fails. Local
    /// tracking is dropped regardless.
    pub async fn pause_tasks(&self, task_ids: &[TaskId]) -> OrchestratorResult<()> {
        let forwarded = self.orchestrator.pause_tasks(task_ids).await;
        let mut books = self.books();
        for task_id in task_ids {
            if books.active.remove(task_id).is_some() {
                books.stopped.insert(*task_id, StopReason::Paused);
            }
        }
        forwarded
    }

    /// Cancels a task and stops tracking it locally.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator error when the cancel request fails. Local
    /// tracking is dropped regardless.
    pub async fn cancel_task(&self, task_id: TaskId) -> OrchestratorResult<()> {
        let forwarded = self.orchestrator.cancel_task(task_id).await;
        let mut books = self.books();
        if books.active.remove(&task_id).is_some() {
            books.stopped.insert(task_id, StopReason::Cancelled);
        }
        forwarded
    }

    /// Returns the ids of tasks currently in flight.
    #[must_use]
    pub fn active_tasks(&self) -> Vec<TaskId> {
        self.books().active.keys().copied().collect()
    }

    /// Returns the ids of in-flight tasks delegated under `correlation_id`.
    #[must_use]
    pub fn active_tasks_for(&self, correlation_id: &str) -> Vec<TaskId> {
        self.books()
            .active
            .iter()
            .filter(|(_, correlation)| correlation.as_str() == correlation_id)
            .map(|(task_id, _)| *task_id)
            .collect()
    }

    /// Returns the orchestrator status.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator error when status retrieval fails.
    pub async fn system_status(&self) -> OrchestratorResult<OrchestratorStatus> {
        self.orchestrator.system_status().await
    }

    fn track(&self, task: &Task, context: &DelegationContext) {
        self.books()
            .active
            .insert(task.id(), context.correlation_id().to_owned());
    }

    /// Removes tracking; returns the stop reason when the task was paused or
    /// cancelled while in flight.
    fn untrack(&self, task_id: TaskId) -> Option<StopReason> {
        let mut books = self.books();
        books.active.remove(&task_id);
        books.stopped.remove(&task_id)
    }

    fn report(&self, result: &TaskResult, context: &DelegationContext) {
        let task_id = result.task.id();
        if let Some(error) = &result.error {
            tracing::warn!(
                %task_id,
                task_type = %result.task_type(),
                correlation = context.correlation_id(),
                delivery = context.delivery_id().unwrap_or_default(),
                %error,
                "task failed"
            );
            self.publish(TaskEvent::Failed {
                task_id,
                error: error.clone(),
            });
        } else {
            let duration_ms = result.duration().num_milliseconds();
            tracing::info!(
                %task_id,
                task_type = %result.task_type(),
                correlation = context.correlation_id(),
                duration_ms,
                "task completed"
            );
            self.publish(TaskEvent::Completed {
                task_id,
                duration_ms,
            });
        }
    }

    fn publish(&self, event: TaskEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("no task event subscribers");
        }
    }

    fn books(&self) -> MutexGuard<'_, Bookkeeping> {
        self.bookkeeping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
