//! Health reporting and admin controls.

use super::ShutdownHandle;
use crate::delegation::services::TaskDelegator;
use crate::resilience::services::CircuitBreaker;
use crate::runtime::{
    domain::{HealthReport, HealthStatus},
    ports::{AgentToggle, DeadLetterError, DeadLetterStore, QueueResult, WebhookQueue},
};
use mockable::Clock;
use std::sync::Arc;

/// Operational surface over the running engine.
pub struct Operations<C>
where
    C: Clock + Send + Sync,
{
    breakers: Vec<Arc<CircuitBreaker<C>>>,
    queue: Arc<dyn WebhookQueue>,
    dead_letters: Arc<dyn DeadLetterStore>,
    delegator: Arc<TaskDelegator<C>>,
    agents: Arc<dyn AgentToggle>,
    shutdown: ShutdownHandle,
    clock: Arc<C>,
}

impl<C> Operations<C>
where
    C: Clock + Send + Sync,
{
    /// Creates the operational surface with no breakers registered.
    #[must_use]
    pub fn new(
        queue: Arc<dyn WebhookQueue>,
        dead_letters: Arc<dyn DeadLetterStore>,
        delegator: Arc<TaskDelegator<C>>,
        agents: Arc<dyn AgentToggle>,
        shutdown: ShutdownHandle,
        clock: Arc<C>,
    ) -> Self {
        Self {
            breakers: Vec::new(),
            queue,
            dead_letters,
            delegator,
            agents,
            shutdown,
            clock,
        }
    }

    /// Registers a breaker for health reporting and manual overrides.
    #[must_use]
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker<C>>) -> Self {
        self.breakers.push(breaker);
        self
    }

    /// Collects a health snapshot. Collaborators that fail to answer are
    /// reported as missing and degrade the status.
    pub async fn health(&self) -> HealthReport {
        let queue = self
            .queue
            .queue_stats()
            .await
            .inspect_err(|error| tracing::warn!(%error, "queue stats unavailable"))
            .ok();
        let dead_letters = self
            .dead_letters
            .stats()
            .await
            .inspect_err(|error| tracing::warn!(%error, "dead-letter stats unavailable"))
            .ok();
        let orchestrator = self
            .delegator
            .system_status()
            .await
            .inspect_err(|error| tracing::warn!(%error, "orchestrator status unavailable"))
            .ok();

        let mut report = HealthReport {
            status: HealthStatus::Healthy,
            breakers: self.breakers.iter().map(|breaker| breaker.status()).collect(),
            queue,
            dead_letters,
            orchestrator,
            active_tasks: self.delegator.active_tasks().len(),
            agents_enabled: self.agents.is_enabled(),
            generated_at: self.clock.utc(),
        };
        report.status = report.derive_status(self.shutdown.is_shutting_down());
        report
    }

    /// Pauses webhook job processing.
    ///
    /// # Errors
    ///
    /// Returns the queue error when the pause fails.
    pub async fn pause_queue(&self) -> QueueResult<()> {
        self.queue.pause().await?;
        tracing::info!("webhook queue paused");
        Ok(())
    }

    /// Resumes webhook job processing.
    ///
    /// # Errors
    ///
    /// Returns the queue error when the resume fails.
    pub async fn resume_queue(&self) -> QueueResult<()> {
        self.queue.resume().await?;
        tracing::info!("webhook queue resumed");
        Ok(())
    }

    /// Clears the dead-letter store and returns how many entries were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns the store error when clearing fails.
    pub async fn clear_dead_letters(&self) -> Result<usize, DeadLetterError> {
        let removed = self.dead_letters.clear().await?;
        tracing::info!(removed, "dead-letter queue cleared");
        Ok(removed)
    }

    /// Enables or disables agent work.
    pub fn set_agents_enabled(&self, enabled: bool) {
        self.agents.set_enabled(enabled);
    }

    /// Forces the named breaker open. Returns `false` for unknown names.
    #[must_use]
    pub fn force_open(&self, name: &str) -> bool {
        let Some(breaker) = self.find(name) else {
            return false;
        };
        breaker.force_open();
        true
    }

    /// Forces the named breaker closed. Returns `false` for unknown names.
    #[must_use]
    pub fn force_close(&self, name: &str) -> bool {
        let Some(breaker) = self.find(name) else {
            return false;
        };
        breaker.force_close();
        true
    }

    /// Resets the named breaker. Returns `false` for unknown names.
    #[must_use]
    pub fn reset_breaker(&self, name: &str) -> bool {
        let Some(breaker) = self.find(name) else {
            return false;
        };
        breaker.reset();
        true
    }

    fn find(&self, name: &str) -> Option<&Arc<CircuitBreaker<C>>> {
        self.breakers.iter().find(|breaker| breaker.name() == name)
    }
}
