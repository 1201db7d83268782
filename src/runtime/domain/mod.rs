//! Domain types for process lifecycle, webhook admission, and health.

mod health;
mod queue;
mod shutdown;

pub use health::{HealthReport, HealthStatus};
pub use queue::{DeadLetterStats, JobId, QueueStats, QueueStatus, WebhookJob};
pub use shutdown::{ShutdownOutcome, ShutdownReason, ShutdownStep, StepFailure};
