//! Failure isolation for external dependencies.
//!
//! Every outbound dependency (GitHub, the AI service) is protected by a
//! [`services::CircuitBreaker`] and a bounded exponential [`services::with_retry`]
//! policy. The two decorators are orthogonal; the resilient port clients
//! retry around the breaker so every attempt is counted by it.
//!
//! - Domain types in [`domain`]
//! - Breaker and retry services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
