//! Priority-grouped task delegation to agent capability pools.
//!
//! Workflow engines turn analysis output into [`domain::Task`] values and hand
//! them to the [`services::TaskDelegator`], which runs each priority bucket
//! concurrently against the [`ports::Orchestrator`] with per-task deadlines.
//! A failed critical task stops lower-priority buckets from starting.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Delegation services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
