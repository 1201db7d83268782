//! Hooks run by the shutdown coordinator.

use async_trait::async_trait;
use thiserror::Error;

/// Side effects of the ordered shutdown sequence.
#[async_trait]
pub trait ShutdownHooks: Send + Sync {
    /// Stops admitting new webhook work.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownHookError`] when admission cannot be stopped.
    async fn stop_admission(&self) -> Result<(), ShutdownHookError>;

    /// Waits for queued webhook jobs to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownHookError`] when the queue cannot be drained.
    async fn drain_queue(&self) -> Result<(), ShutdownHookError>;

    /// Closes shared connections.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownHookError`] when any connection fails to close.
    async fn release_connections(&self) -> Result<(), ShutdownHookError>;
}

/// Failure reported by a shutdown hook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ShutdownHookError(pub String);

impl ShutdownHookError {
    /// Builds a hook error from any displayable error.
    #[must_use]
    pub fn from_display(err: &impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}
