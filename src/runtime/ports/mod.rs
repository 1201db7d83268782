//! Port contracts for the collaborators around the workflow engines.

mod agents;
mod connection;
mod dead_letter;
mod queue;
mod shutdown;

pub use agents::AgentToggle;
pub use connection::{ConnectionError, SharedConnection};
pub use dead_letter::{DeadLetterError, DeadLetterStore};
pub use queue::{QueueError, QueueResult, WebhookQueue};
pub use shutdown::{ShutdownHookError, ShutdownHooks};
