//! Task outcomes produced by the delegator.

use super::{Task, TaskPriority, TaskType};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Terminal status of a delegated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The agent returned output before the deadline.
    Completed,
    /// The agent failed, timed out, or the task was stopped locally.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical lower-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Single problem reported by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Human-readable description.
    pub message: String,
    /// Agent-assigned severity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Affected file path, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Affected line, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl Finding {
    /// Creates a finding with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: None,
            file: None,
            line: None,
        }
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Sets the affected file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Structured output returned by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// One-line summary of the work performed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Problems found.
    #[serde(default, alias = "issues")]
    pub findings: Vec<Finding>,
    /// Suggested follow-ups.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Whether the agent considers the change unmergeable.
    #[serde(default)]
    pub blocking: bool,
    /// Agent-specific fields.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl TaskOutput {
    /// Creates output with a summary.
    #[must_use]
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::default()
        }
    }

    /// Adds a finding.
    #[must_use]
    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    /// Adds a recommendation.
    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    /// Marks the output as blocking.
    #[must_use]
    pub const fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

/// Outcome of one delegated task. Produced exactly once per task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// The originating task.
    pub task: Task,
    /// Terminal status.
    pub status: TaskStatus,
    /// Agent output for completed tasks.
    pub output: Option<TaskOutput>,
    /// Failure description for failed tasks.
    pub error: Option<String>,
    /// Delegation start time.
    pub started_at: DateTime<Utc>,
    /// Settlement time.
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    /// Creates a completed result.
    #[must_use]
    pub const fn completed(
        task: Task,
        output: TaskOutput,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task,
            status: TaskStatus::Completed,
            output: Some(output),
            error: None,
            started_at,
            completed_at,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(
        task: Task,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task,
            status: TaskStatus::Failed,
            output: None,
            error: Some(error.into()),
            started_at,
            completed_at,
        }
    }

    /// Returns whether the task failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    /// Returns whether this is a failed critical task.
    #[must_use]
    pub fn is_critical_failure(&self) -> bool {
        self.is_failed() && self.task.priority() == TaskPriority::Critical
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task.task_type()
    }

    /// Returns the time between delegation and settlement.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.completed_at - self.started_at
    }

    /// Returns the reported findings, empty for failed tasks.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        self.output
            .as_ref()
            .map(|output| output.findings.as_slice())
            .unwrap_or_default()
    }

    /// Returns whether the agent marked its output as blocking.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.output.as_ref().is_some_and(|output| output.blocking)
    }
}
