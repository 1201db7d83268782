//! Error types for parsing task enumerations.

use thiserror::Error;

/// Error returned when a task priority, type, or agent name is unknown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseTaskValueError {
    /// Unknown priority name.
    #[error("unknown task priority: {0}")]
    Priority(String),

    /// Unknown task type name.
    #[error("unknown task type: {0}")]
    TaskType(String),

    /// Unknown agent capability name.
    #[error("unknown agent type: {0}")]
    AgentType(String),
}
