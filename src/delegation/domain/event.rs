//! Task lifecycle notifications.

use super::{TaskId, TaskType};
use serde::{Deserialize, Serialize};

/// Notification published by the delegator as tasks start and settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A task was handed to the orchestrator.
    Started {
        /// Task identifier.
        task_id: TaskId,
        /// Task type.
        task_type: TaskType,
        /// Correlation key of the batch.
        correlation_id: String,
    },
    /// A task completed.
    Completed {
        /// Task identifier.
        task_id: TaskId,
        /// Execution time in milliseconds.
        duration_ms: i64,
    },
    /// A task failed, timed out, or was stopped.
    Failed {
        /// Task identifier.
        task_id: TaskId,
        /// Failure description.
        error: String,
    },
}
