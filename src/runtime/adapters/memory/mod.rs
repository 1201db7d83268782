//! In-memory runtime adapters for tests and dry-run replays.

mod agents;
mod connection;
mod dead_letter;
mod queue;

pub use agents::InMemoryAgentToggle;
pub use connection::InMemoryConnection;
pub use dead_letter::InMemoryDeadLetters;
pub use queue::InMemoryWebhookQueue;
