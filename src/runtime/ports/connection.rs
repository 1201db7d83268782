//! Shared connections released at shutdown.

use async_trait::async_trait;
use thiserror::Error;

/// A long-lived connection shared across the process.
#[async_trait]
pub trait SharedConnection: Send + Sync {
    /// Returns a name for logs.
    fn name(&self) -> &str;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the connection does not close
    /// cleanly.
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Failure to close a shared connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to close {name}: {message}")]
pub struct ConnectionError {
    /// Connection name.
    pub name: String,
    /// Failure detail.
    pub message: String,
}
