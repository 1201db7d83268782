//! Port contracts for task execution.

pub mod orchestrator;

pub use orchestrator::{
    AgentPoolStatus, Orchestrator, OrchestratorError, OrchestratorResult, OrchestratorStatus,
};
