//! Aggregated health report.

use super::{DeadLetterStats, QueueStats};
use crate::delegation::ports::OrchestratorStatus;
use crate::resilience::domain::{BreakerState, BreakerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Every dependency is reachable.
    Healthy,
    /// A breaker is not closed or a collaborator could not report.
    Degraded,
    /// Shutdown has begun.
    ShuttingDown,
}

/// Snapshot served by the health surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Breaker snapshots, one per dependency.
    pub breakers: Vec<BreakerStatus>,
    /// Queue counters, when the queue answered.
    pub queue: Option<QueueStats>,
    /// Dead-letter counters, when the store answered.
    pub dead_letters: Option<DeadLetterStats>,
    /// Orchestrator status, when it answered.
    pub orchestrator: Option<OrchestratorStatus>,
    /// Task ids the local delegator is still tracking.
    pub active_tasks: usize,
    /// Whether agent work is enabled.
    pub agents_enabled: bool,
    /// Report time.
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    /// Derives the overall status from the collected parts.
    #[must_use]
    pub fn derive_status(&self, shutting_down: bool) -> HealthStatus {
        if shutting_down {
            return HealthStatus::ShuttingDown;
        }
        let breakers_closed = self
            .breakers
            .iter()
            .all(|breaker| breaker.state == BreakerState::Closed);
        let collaborators_answered =
            self.queue.is_some() && self.dead_letters.is_some() && self.orchestrator.is_some();
        if breakers_closed && collaborators_answered {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}
