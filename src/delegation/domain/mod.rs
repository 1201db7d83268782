//! Domain model for delegated agent tasks.

mod context;
mod error;
mod event;
mod ids;
mod result;
mod task;

pub use context::DelegationContext;
pub use error::ParseTaskValueError;
pub use event::TaskEvent;
pub use ids::TaskId;
pub use result::{Finding, TaskOutput, TaskResult, TaskStatus};
pub use task::{AgentType, Task, TaskPriority, TaskType};
