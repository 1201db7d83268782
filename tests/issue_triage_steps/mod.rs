//! Step definitions for issue triage scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
