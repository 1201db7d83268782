//! Domain model for circuit breaking and retry policies.
//!
//! The breaker state machine is a plain value driven by explicit timestamps,
//! so the service layer owns the clock and the locking.

mod config;
mod error;
mod state;

pub use config::{BreakerConfig, ExpectedError, RetryPolicy};
pub use error::{BreakerOpen, CircuitError, DependencyError};
pub use state::{BreakerState, BreakerStatus, CircuitBreakerState};
