//! Breaker and retry decorators for fallible async operations.

mod breaker;
mod retry;

pub use breaker::{CircuitBreaker, with_breaker};
pub use retry::with_retry;
