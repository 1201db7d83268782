//! Error types for workflow domain values.

use thiserror::Error;

/// Errors raised while building workflow domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowDomainError {
    /// A repository name is not in `owner/name` form.
    #[error("invalid repository name '{0}', expected owner/name")]
    InvalidRepository(String),

    /// A webhook payload is missing required fields.
    #[error("malformed {event} payload: {reason}")]
    MalformedPayload {
        /// Webhook event name.
        event: String,
        /// Deserialization failure.
        reason: String,
    },

    /// A comment template failed to render.
    #[error("failed to render {template}: {reason}")]
    Render {
        /// Template name.
        template: &'static str,
        /// Rendering failure.
        reason: String,
    },
}
