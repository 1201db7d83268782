//! Webhook jobs and queue statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to an admitted webhook job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A webhook delivery waiting to be routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookJob {
    /// Job identifier.
    pub id: JobId,
    /// `X-GitHub-Event` name.
    pub event: String,
    /// `X-GitHub-Delivery` identifier, when sent.
    pub delivery_id: Option<String>,
    /// Raw JSON payload.
    pub payload: Value,
    /// Admission time.
    pub received_at: DateTime<Utc>,
}

impl WebhookJob {
    /// Creates a job with a fresh identifier.
    #[must_use]
    pub fn new(
        event: impl Into<String>,
        delivery_id: Option<String>,
        payload: Value,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new(),
            event: event.into(),
            delivery_id,
            payload,
            received_at,
        }
    }
}

/// Acknowledgement returned when a job is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Identifier of the queued job.
    pub job_id: JobId,
    /// Jobs waiting ahead of and including this one.
    pub depth: usize,
}

/// Queue counters for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting to run.
    pub waiting: usize,
    /// Jobs currently running.
    pub active: usize,
    /// Jobs finished successfully.
    pub completed: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Maximum number of waiting jobs.
    pub capacity: usize,
    /// Whether job processing is paused.
    pub paused: bool,
}

/// Dead-letter counters for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterStats {
    /// Stored permanently failed jobs.
    pub count: usize,
    /// Time the oldest entry was stored.
    pub oldest: Option<DateTime<Utc>>,
}
