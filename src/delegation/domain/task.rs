//! Task value and its classification enums.

use super::{ParseTaskValueError, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Delegation priority. Variant order is bucket execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Runs first; a failure halts later buckets.
    Critical,
    /// Runs after critical tasks.
    High,
    /// Runs after high-priority tasks.
    Medium,
    /// Runs last.
    Low,
}

impl TaskPriority {
    /// All priorities in bucket execution order.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Returns the canonical lower-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseTaskValueError::Priority(value.to_owned())),
        }
    }
}

/// Kind of analysis or generation work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Security review of a change or issue.
    SecurityReview,
    /// General code review.
    CodeReview,
    /// Test execution and coverage analysis.
    Testing,
    /// Documentation completeness review.
    Documentation,
    /// Performance impact review.
    PerformanceReview,
    /// Deployment readiness check.
    DeploymentCheck,
    /// Code generation for an issue.
    CodeGeneration,
    /// Documentation generation for an issue.
    DocumentationGeneration,
}

impl TaskType {
    /// Returns the canonical snake-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecurityReview => "security_review",
            Self::CodeReview => "code_review",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::PerformanceReview => "performance_review",
            Self::DeploymentCheck => "deployment_check",
            Self::CodeGeneration => "code_generation",
            Self::DocumentationGeneration => "documentation_generation",
        }
    }

    /// Returns the capability pool that executes this task type.
    #[must_use]
    pub const fn agent_type(self) -> AgentType {
        match self {
            Self::SecurityReview => AgentType::Security,
            Self::CodeReview => AgentType::CodeReview,
            Self::Testing => AgentType::Testing,
            Self::Documentation | Self::DocumentationGeneration => AgentType::Documentation,
            Self::PerformanceReview => AgentType::Performance,
            Self::DeploymentCheck => AgentType::Deployment,
            Self::CodeGeneration => AgentType::CodeGeneration,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "security_review" => Ok(Self::SecurityReview),
            "code_review" => Ok(Self::CodeReview),
            "testing" => Ok(Self::Testing),
            "documentation" => Ok(Self::Documentation),
            "performance_review" => Ok(Self::PerformanceReview),
            "deployment_check" => Ok(Self::DeploymentCheck),
            "code_generation" => Ok(Self::CodeGeneration),
            "documentation_generation" => Ok(Self::DocumentationGeneration),
            _ => Err(ParseTaskValueError::TaskType(value.to_owned())),
        }
    }
}

/// Specialized capability pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    /// Security analysis agents.
    Security,
    /// Code review agents.
    CodeReview,
    /// Test agents.
    Testing,
    /// Documentation agents.
    Documentation,
    /// Performance analysis agents.
    Performance,
    /// Deployment agents.
    Deployment,
    /// Code generation agents.
    CodeGeneration,
}

impl AgentType {
    /// All capability pools.
    pub const ALL: [Self; 7] = [
        Self::Security,
        Self::CodeReview,
        Self::Testing,
        Self::Documentation,
        Self::Performance,
        Self::Deployment,
        Self::CodeGeneration,
    ];

    /// Returns the canonical kebab-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::CodeReview => "code-review",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::Performance => "performance",
            Self::Deployment => "deployment",
            Self::CodeGeneration => "code-generation",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentType {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::AgentType(value.to_owned()))
    }
}

/// Unit of work delegated to one agent capability.
///
/// Tasks are immutable once delegated; retries use [`Task::derive_retry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    priority: TaskPriority,
    agent_type: AgentType,
    payload: Value,
    timeout: Duration,
    retries: u32,
}

impl Task {
    /// Creates a task routed to the default capability for its type.
    #[must_use]
    pub fn new(
        task_type: TaskType,
        priority: TaskPriority,
        timeout: Duration,
        retries: u32,
        payload: Value,
    ) -> Self {
        Self {
            id: TaskId::new(),
            task_type,
            priority,
            agent_type: task_type.agent_type(),
            payload,
            timeout,
            retries,
        }
    }

    /// Routes the task to a specific capability pool.
    #[must_use]
    pub const fn with_agent(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    /// Builds the task used for a retry: a fresh id and one retry fewer.
    #[must_use]
    pub fn derive_retry(&self) -> Self {
        Self {
            id: TaskId::new(),
            retries: self.retries.saturating_sub(1),
            ..self.clone()
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the delegation priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the executing capability pool.
    #[must_use]
    pub const fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Returns the opaque task payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the wall-clock deadline for one execution.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the remaining retry budget.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }
}
