//! Dead-letter store port.

use crate::runtime::domain::DeadLetterStats;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Storage for permanently failed webhook jobs.
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Returns counters for the stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`DeadLetterError`] when the backing store fails.
    async fn stats(&self) -> Result<DeadLetterStats, DeadLetterError>;

    /// Removes every entry and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DeadLetterError`] when the backing store fails.
    async fn clear(&self) -> Result<usize, DeadLetterError>;
}

/// Dead-letter store failure.
#[derive(Debug, Clone, Error)]
#[error("dead-letter store error: {0}")]
pub struct DeadLetterError(Arc<dyn std::error::Error + Send + Sync>);

impl DeadLetterError {
    /// Wraps a backing store error.
    #[must_use]
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
