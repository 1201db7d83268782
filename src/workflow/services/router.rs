//! Dispatches webhook deliveries to the workflow engines.

use super::{IssueWorkflowService, PrWorkflowService};
use crate::workflow::domain::{WebhookEvent, WorkflowDomainError};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// What the router did with a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The delivery reached an engine.
    Handled,
    /// The delivery was deliberately dropped.
    Ignored(&'static str),
}

/// Routes typed webhook events to the pull request and issue engines.
pub struct WebhookRouter<C>
where
    C: Clock + Send + Sync,
{
    pull_requests: Arc<PrWorkflowService<C>>,
    issues: Arc<IssueWorkflowService<C>>,
}

impl<C> WebhookRouter<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a router over both engines.
    #[must_use]
    pub const fn new(
        pull_requests: Arc<PrWorkflowService<C>>,
        issues: Arc<IssueWorkflowService<C>>,
    ) -> Self {
        Self {
            pull_requests,
            issues,
        }
    }

    /// Returns the pull request engine.
    #[must_use]
    pub const fn pull_requests(&self) -> &Arc<PrWorkflowService<C>> {
        &self.pull_requests
    }

    /// Returns the issue engine.
    #[must_use]
    pub const fn issues(&self) -> &Arc<IssueWorkflowService<C>> {
        &self.issues
    }

    /// Parses a raw delivery and routes it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError`] when the payload cannot be parsed.
    pub async fn route_payload(
        &self,
        event: &str,
        delivery_id: Option<&str>,
        payload: &Value,
    ) -> Result<RouteOutcome, WorkflowDomainError> {
        let parsed = WebhookEvent::parse(event, payload)?;
        Ok(self.route(parsed, delivery_id).await)
    }

    /// Routes a parsed event to the engine that owns it.
    pub async fn route(&self, event: WebhookEvent, delivery_id: Option<&str>) -> RouteOutcome {
        match event {
            WebhookEvent::PullRequest {
                action,
                pull_request,
                repository,
            } => {
                self.pull_requests
                    .handle_event(&action, &pull_request, &repository, delivery_id)
                    .await;
                RouteOutcome::Handled
            }
            WebhookEvent::Issue {
                action,
                issue,
                repository,
            } => {
                self.issues
                    .handle_event(&action, &issue, &repository, delivery_id)
                    .await;
                RouteOutcome::Handled
            }
            WebhookEvent::Comment { comment, .. } if comment.author_is_bot => {
                tracing::debug!(author = %comment.author, "ignoring bot comment");
                RouteOutcome::Ignored("bot comment")
            }
            WebhookEvent::Comment {
                issue,
                comment,
                repository,
                on_pull_request: true,
            } => {
                self.pull_requests
                    .handle_command(issue.number, &comment, &repository, delivery_id)
                    .await
                    .map_or(RouteOutcome::Ignored("no command"), |_| {
                        RouteOutcome::Handled
                    })
            }
            WebhookEvent::Comment {
                issue,
                comment,
                repository,
                on_pull_request: false,
            } => self
                .issues
                .handle_command(&issue, &comment, &repository, delivery_id)
                .await
                .map_or(RouteOutcome::Ignored("no command"), |_| {
                    RouteOutcome::Handled
                }),
            WebhookEvent::Ping => {
                tracing::info!(delivery = delivery_id.unwrap_or_default(), "webhook ping");
                RouteOutcome::Handled
            }
            WebhookEvent::Ignored { event, action } => {
                tracing::debug!(%event, action = action.as_deref().unwrap_or_default(), "unhandled event");
                RouteOutcome::Ignored("unhandled event")
            }
        }
    }
}
