//! Webhook admission gated by shutdown and queue capacity.

use super::ShutdownHandle;
use crate::runtime::{
    domain::{QueueStatus, WebhookJob},
    ports::{QueueError, QueueResult, WebhookQueue},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// Decision returned for an inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The job was queued.
    Accepted(QueueStatus),
    /// Shutdown has begun or the queue is closed.
    Unavailable,
    /// The queue is full.
    Overloaded {
        /// Jobs waiting.
        waiting: usize,
        /// Configured capacity.
        capacity: usize,
    },
}

impl AdmissionDecision {
    /// Returns the HTTP status the transport should answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Accepted(_) => 202,
            Self::Unavailable | Self::Overloaded { .. } => 503,
        }
    }
}

/// Front door for webhook deliveries.
pub struct WebhookAdmission<C>
where
    C: Clock + Send + Sync,
{
    queue: Arc<dyn WebhookQueue>,
    shutdown: ShutdownHandle,
    clock: Arc<C>,
}

impl<C> WebhookAdmission<C>
where
    C: Clock + Send + Sync,
{
    /// Creates the admission gate.
    #[must_use]
    pub fn new(queue: Arc<dyn WebhookQueue>, shutdown: ShutdownHandle, clock: Arc<C>) -> Self {
        Self {
            queue,
            shutdown,
            clock,
        }
    }

    /// Queues a delivery unless shutdown has begun or the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] when the queue fails for any other
    /// reason.
    pub async fn admit(
        &self,
        event: &str,
        delivery_id: Option<&str>,
        payload: Value,
    ) -> QueueResult<AdmissionDecision> {
        if self.shutdown.is_shutting_down() {
            tracing::info!(%event, delivery = delivery_id.unwrap_or_default(), "rejecting webhook during shutdown");
            return Ok(AdmissionDecision::Unavailable);
        }
        let job = WebhookJob::new(
            event,
            delivery_id.map(str::to_owned),
            payload,
            self.clock.utc(),
        );
        match self.queue.add_webhook_job(job).await {
            Ok(status) => {
                tracing::debug!(%event, job = %status.job_id, depth = status.depth, "webhook queued");
                Ok(AdmissionDecision::Accepted(status))
            }
            Err(QueueError::Overloaded { waiting, capacity }) => {
                tracing::warn!(%event, waiting, capacity, "webhook queue overloaded");
                Ok(AdmissionDecision::Overloaded { waiting, capacity })
            }
            Err(QueueError::Closed) => Ok(AdmissionDecision::Unavailable),
            Err(error) => Err(error),
        }
    }
}
