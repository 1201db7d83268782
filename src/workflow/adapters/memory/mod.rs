//! In-memory forge and AI adapters.

mod ai;
mod github;

pub use ai::ScriptedAi;
pub use github::{InMemoryGitHub, PostedComment};
