//! Shutdown hooks backed by the webhook queue and shared connections.

use crate::runtime::ports::{ShutdownHookError, ShutdownHooks, SharedConnection, WebhookQueue};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Drains the webhook queue and closes shared connections.
pub struct QueueShutdownHooks {
    queue: Arc<dyn WebhookQueue>,
    connections: Vec<Arc<dyn SharedConnection>>,
}

impl QueueShutdownHooks {
    /// Creates hooks for `queue` with no shared connections.
    #[must_use]
    pub const fn new(queue: Arc<dyn WebhookQueue>) -> Self {
        Self {
            queue,
            connections: Vec::new(),
        }
    }

    /// Adds a connection closed by [`ShutdownHooks::release_connections`].
    #[must_use]
    pub fn with_connection(mut self, connection: Arc<dyn SharedConnection>) -> Self {
        self.connections.push(connection);
        self
    }
}

#[async_trait]
impl ShutdownHooks for QueueShutdownHooks {
    async fn stop_admission(&self) -> Result<(), ShutdownHookError> {
        let stats = self
            .queue
            .queue_stats()
            .await
            .map_err(|error| ShutdownHookError::from_display(&error))?;
        tracing::info!(
            waiting = stats.waiting,
            active = stats.active,
            "webhook admission closed"
        );
        Ok(())
    }

    async fn drain_queue(&self) -> Result<(), ShutdownHookError> {
        let drained = self
            .queue
            .drain()
            .await
            .map_err(|error| ShutdownHookError::from_display(&error))?;
        tracing::info!(drained, "webhook queue drained");
        Ok(())
    }

    async fn release_connections(&self) -> Result<(), ShutdownHookError> {
        let results = join_all(self.connections.iter().map(|connection| connection.close())).await;
        let failures: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|error| error.to_string())
            .collect();
        if failures.is_empty() {
            tracing::info!(count = self.connections.len(), "shared connections released");
            return Ok(());
        }
        Err(ShutdownHookError(failures.join("; ")))
    }
}
