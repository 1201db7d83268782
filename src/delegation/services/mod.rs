//! Delegation services.

mod delegator;
mod events;

pub use delegator::TaskDelegator;
pub use events::log_task_events;
