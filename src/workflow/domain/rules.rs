//! Fixed task-generation rules.

use crate::delegation::domain::{Task, TaskPriority, TaskType};
use serde_json::Value;
use std::time::Duration;

/// Parameters of one generated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRule {
    /// Task type to create.
    pub task_type: TaskType,
    /// Delegation priority.
    pub priority: TaskPriority,
    /// Per-task deadline.
    pub timeout: Duration,
    /// Retry budget.
    pub retries: u32,
}

impl TaskRule {
    const fn new(task_type: TaskType, priority: TaskPriority, timeout_ms: u64, retries: u32) -> Self {
        Self {
            task_type,
            priority,
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }

    /// Builds a task carrying `payload`.
    #[must_use]
    pub fn build(&self, payload: Value) -> Task {
        Task::new(
            self.task_type,
            self.priority,
            self.timeout,
            self.retries,
            payload,
        )
    }
}

/// Pull request rules, in table order.
pub const PR_TASK_RULES: [TaskRule; 6] = [
    TaskRule::new(TaskType::SecurityReview, TaskPriority::High, 300_000, 2),
    TaskRule::new(TaskType::CodeReview, TaskPriority::Medium, 600_000, 1),
    TaskRule::new(TaskType::Testing, TaskPriority::Medium, 900_000, 1),
    TaskRule::new(TaskType::Documentation, TaskPriority::Low, 300_000, 1),
    TaskRule::new(TaskType::PerformanceReview, TaskPriority::Medium, 450_000, 1),
    TaskRule::new(TaskType::DeploymentCheck, TaskPriority::High, 300_000, 2),
];

/// Security review requested for a security issue.
pub const ISSUE_SECURITY_RULE: TaskRule =
    TaskRule::new(TaskType::SecurityReview, TaskPriority::Critical, 300_000, 2);

/// Documentation generation for an auto-generatable documentation issue.
pub const ISSUE_DOCS_RULE: TaskRule = TaskRule::new(
    TaskType::DocumentationGeneration,
    TaskPriority::Low,
    300_000,
    1,
);

/// Code generation for any other auto-generatable issue.
pub const ISSUE_CODE_RULE: TaskRule =
    TaskRule::new(TaskType::CodeGeneration, TaskPriority::Medium, 900_000, 1);

/// Looks up the pull request rule for a task type.
#[must_use]
pub fn pr_rule(task_type: TaskType) -> Option<TaskRule> {
    PR_TASK_RULES
        .into_iter()
        .find(|rule| rule.task_type == task_type)
}
