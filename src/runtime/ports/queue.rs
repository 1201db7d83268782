//! Backpressure-controlled webhook queue port.

use crate::runtime::domain::{QueueStats, QueueStatus, WebhookJob};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Admission queue for webhook jobs.
#[async_trait]
pub trait WebhookQueue: Send + Sync {
    /// Queues a job.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Overloaded`] when the queue is full and
    /// [`QueueError::Closed`] once it has been drained.
    async fn add_webhook_job(&self, job: WebhookJob) -> QueueResult<QueueStatus>;

    /// Returns current counters.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the backing store fails.
    async fn queue_stats(&self) -> QueueResult<QueueStats>;

    /// Closes the queue and waits for queued jobs to finish.
    ///
    /// Returns the number of jobs finished while draining.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the backing store fails.
    async fn drain(&self) -> QueueResult<usize>;

    /// Stops handing jobs to workers.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the backing store fails.
    async fn pause(&self) -> QueueResult<()>;

    /// Resumes handing jobs to workers.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the backing store fails.
    async fn resume(&self) -> QueueResult<()>;
}

/// Errors returned by queue implementations.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("queue overloaded: {waiting} jobs waiting, capacity {capacity}")]
    Overloaded {
        /// Jobs waiting.
        waiting: usize,
        /// Configured capacity.
        capacity: usize,
    },

    /// The queue no longer accepts jobs.
    #[error("queue is closed")]
    Closed,

    /// Backing store failure.
    #[error("queue backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl QueueError {
    /// Wraps a backing store error.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
