//! In-memory orchestrator adapter.

mod orchestrator;

pub use orchestrator::{InMemoryOrchestrator, ScriptedOutcome};
