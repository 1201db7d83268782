//! Workflow engines and the resilient port decorators they call through.

mod deps;
mod error;
mod issue;
mod pull_request;
mod resilient;
mod router;

pub use deps::WorkflowDeps;
pub use error::{WorkflowError, WorkflowResult};
pub use issue::{DuplicateCandidate, IssueWorkflowService};
pub use pull_request::PrWorkflowService;
pub use resilient::{
    ResilientAiService, ResilientGitHubClient, ai_breaker_config, github_breaker_config,
};
pub use router::{RouteOutcome, WebhookRouter};
