//! Forgewatch: resilient GitHub webhook automation.
//!
//! Webhook deliveries are admitted into a bounded queue, routed to the pull
//! request or issue engine, analysed, and fanned out as tasks to an external
//! agent orchestrator. Every call to GitHub and the AI service passes through
//! a circuit breaker with retry, and a single coordinator drains the engine
//! on termination signals.
//!
//! # Architecture
//!
//! Forgewatch follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: In-memory implementations of ports for tests and replays
//!
//! # Modules
//!
//! - [`resilience`]: Circuit breakers and retry with backoff
//! - [`delegation`]: Task fan-out to the agent orchestrator
//! - [`workflow`]: Pull request and issue engines, webhook routing
//! - [`runtime`]: Admission, shutdown coordination, and health
//! - [`config`]: Environment-driven engine settings
//! - [`telemetry`]: Log subscriber set-up
//! - [`replay`]: Dry-run engine over recorded deliveries

pub mod config;
pub mod delegation;
pub mod replay;
pub mod resilience;
pub mod runtime;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
mod test_support;
