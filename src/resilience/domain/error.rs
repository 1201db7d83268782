//! Error types shared by the breaker and retry decorators.

use super::BreakerState;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Classification hooks for errors returned by protected dependencies.
///
/// Both methods have defaults so simple error types only need the marker
/// implementation.
pub trait DependencyError: std::error::Error + Send + Sync + 'static {
    /// Machine-readable error code, when the dependency reports one.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Whether retrying the call may succeed.
    fn is_transient(&self) -> bool {
        true
    }
}

/// Returned without running the operation while a breaker rejects calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("circuit breaker '{name}' is {state}; next attempt at {next_attempt_time:?}")]
pub struct BreakerOpen {
    /// Name of the rejecting breaker.
    pub name: String,
    /// Breaker state at rejection time.
    pub state: BreakerState,
    /// Earliest time a trial call is admitted.
    pub next_attempt_time: Option<DateTime<Utc>>,
}

/// Outcome of an operation executed through a breaker.
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// The breaker rejected the call; nothing was attempted.
    #[error(transparent)]
    Open(BreakerOpen),

    /// The operation ran and failed.
    #[error(transparent)]
    Operation(E),
}
