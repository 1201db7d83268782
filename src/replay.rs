//! Dry-run engine that replays recorded webhook deliveries.
//!
//! Every collaborator is an in-memory adapter: the forge records comments,
//! labels, and statuses; the orchestrator completes each task at once; the
//! AI service is absent, so analysis falls back to heuristics. Deliveries go
//! through the same admission, queue, router, and shutdown path as a live
//! deployment.

use crate::config::EngineConfig;
use crate::delegation::{
    adapters::memory::InMemoryOrchestrator,
    domain::TaskType,
    services::{TaskDelegator, log_task_events},
};
use crate::resilience::{domain::RetryPolicy, services::CircuitBreaker};
use crate::runtime::{
    adapters::memory::{
        InMemoryAgentToggle, InMemoryConnection, InMemoryDeadLetters, InMemoryWebhookQueue,
    },
    domain::{HealthReport, ShutdownOutcome, ShutdownReason},
    ports::{AgentToggle, QueueError},
    services::{
        AdmissionDecision, FatalReporter, Operations, QueueShutdownHooks, ShutdownCoordinator,
        Supervised, WebhookAdmission,
    },
};
use crate::workflow::{
    adapters::memory::{InMemoryGitHub, PostedComment, ScriptedAi},
    services::{
        IssueWorkflowService, PrWorkflowService, ResilientAiService, ResilientGitHubClient,
        RouteOutcome, WebhookRouter, WorkflowDeps,
    },
};
use mockable::{Clock, DefaultClock};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A recorded webhook delivery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Delivery {
    /// `X-GitHub-Event` name.
    pub event: String,
    /// `X-GitHub-Delivery` identifier.
    #[serde(default)]
    pub delivery_id: Option<String>,
    /// Raw JSON payload.
    pub payload: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Recording {
    Many(Vec<Delivery>),
    One(Delivery),
}

impl Delivery {
    /// Parses a recording holding one delivery or an array of them.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the text is not a recording.
    pub fn parse_recording(text: &str) -> Result<Vec<Self>, serde_json::Error> {
        Ok(match serde_json::from_str(text)? {
            Recording::Many(deliveries) => deliveries,
            Recording::One(delivery) => vec![delivery],
        })
    }
}

/// Errors that abort a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The webhook queue failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// What a replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// HTTP status answered to each delivery, in order.
    pub responses: Vec<u16>,
    /// Jobs routed to an engine.
    pub handled: usize,
    /// Reasons for jobs the router dropped.
    pub ignored: Vec<&'static str>,
    /// Jobs whose payload could not be parsed.
    pub dead_lettered: usize,
    /// Comments posted to the forge.
    pub comments: Vec<PostedComment>,
    /// Task types executed by the orchestrator, in call order.
    pub executed: Vec<TaskType>,
}

/// Engine wired to in-memory adapters.
pub struct ReplayEngine {
    github: InMemoryGitHub,
    orchestrator: InMemoryOrchestrator,
    queue: InMemoryWebhookQueue,
    dead_letters: InMemoryDeadLetters,
    clock: Arc<DefaultClock>,
    admission: WebhookAdmission<DefaultClock>,
    router: WebhookRouter<DefaultClock>,
    operations: Operations<DefaultClock>,
    coordinator: ShutdownCoordinator,
}

impl ReplayEngine {
    /// Assembles the engine from `config`.
    ///
    /// Must be called inside a tokio runtime; task events are logged by a
    /// spawned consumer whose panic counts as a fatal error.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let clock = Arc::new(DefaultClock);
        let github = InMemoryGitHub::new();
        let orchestrator = InMemoryOrchestrator::new();
        let queue = InMemoryWebhookQueue::new(config.queue_capacity);
        let dead_letters = InMemoryDeadLetters::new();
        let agents: Arc<dyn AgentToggle> =
            Arc::new(InMemoryAgentToggle::new(config.agents_enabled));

        let github_breaker = Arc::new(CircuitBreaker::new(
            config.github_breaker(),
            Arc::clone(&clock),
        ));
        let ai_breaker = Arc::new(CircuitBreaker::new(config.ai_breaker(), Arc::clone(&clock)));
        let ai_policy = RetryPolicy::ai();
        let delegator = Arc::new(TaskDelegator::new(
            Arc::new(orchestrator.clone()),
            Arc::clone(&clock),
        ));
        let coordinator = ShutdownCoordinator::new(
            Arc::new(
                QueueShutdownHooks::new(Arc::new(queue.clone()))
                    .with_connection(Arc::new(InMemoryConnection::new("github"))),
            ),
            config.shutdown_ceiling(),
        );
        coordinator
            .fatal_reporter()
            .spawn_supervised("task event logger", log_task_events(delegator.subscribe()));
        let deps = WorkflowDeps {
            github: Arc::new(ResilientGitHubClient::new(
                Arc::new(github.clone()),
                Arc::clone(&github_breaker),
            )),
            ai: Arc::new(
                ResilientAiService::new(Arc::new(ScriptedAi::new()), Arc::clone(&ai_breaker))
                    .with_policy(RetryPolicy::new(0, ai_policy.base_delay, ai_policy.max_delay)),
            ),
            delegator: Arc::clone(&delegator),
            agents: Arc::clone(&agents),
            clock: Arc::clone(&clock),
        };
        let router = WebhookRouter::new(
            Arc::new(PrWorkflowService::new(deps.clone(), coordinator.handle())),
            Arc::new(IssueWorkflowService::new(deps)),
        );
        let admission = WebhookAdmission::new(
            Arc::new(queue.clone()),
            coordinator.handle(),
            Arc::clone(&clock),
        );
        let operations = Operations::new(
            Arc::new(queue.clone()),
            Arc::new(dead_letters.clone()),
            delegator,
            agents,
            coordinator.handle(),
            Arc::clone(&clock),
        )
        .with_breaker(github_breaker)
        .with_breaker(ai_breaker);

        Self {
            github,
            orchestrator,
            queue,
            dead_letters,
            clock,
            admission,
            router,
            operations,
            coordinator,
        }
    }

    /// Admits every delivery, then routes queued jobs until the queue is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Queue`] when the queue backend fails.
    pub async fn replay(&self, deliveries: Vec<Delivery>) -> Result<ReplaySummary, ReplayError> {
        let mut summary = ReplaySummary::default();
        for delivery in deliveries {
            let decision = self
                .admission
                .admit(
                    &delivery.event,
                    delivery.delivery_id.as_deref(),
                    delivery.payload,
                )
                .await?;
            if let AdmissionDecision::Overloaded { waiting, capacity } = decision {
                tracing::warn!(event = %delivery.event, waiting, capacity, "delivery rejected");
            }
            summary.responses.push(decision.http_status());
        }

        while let Some(job) = self.queue.next_job() {
            match self
                .router
                .route_payload(&job.event, job.delivery_id.as_deref(), &job.payload)
                .await
            {
                Ok(RouteOutcome::Handled) => summary.handled += 1,
                Ok(RouteOutcome::Ignored(reason)) => summary.ignored.push(reason),
                Err(error) => {
                    tracing::warn!(job = %job.id, event = %job.event, %error, "dead-lettering job");
                    self.dead_letters.push(self.clock.utc());
                    summary.dead_lettered += 1;
                    self.queue.finish(false);
                    continue;
                }
            }
            self.queue.finish(true);
        }

        summary.comments = self.github.comments();
        summary.executed = self
            .orchestrator
            .executed()
            .iter()
            .map(|task| task.task_type())
            .collect();
        Ok(summary)
    }

    /// Replays `deliveries`, running the shutdown sequence with a fatal
    /// reason when the replay fails or panics.
    pub async fn replay_supervised(&self, deliveries: Vec<Delivery>) -> Supervised<ReplaySummary> {
        self.coordinator.supervise(self.replay(deliveries)).await
    }

    /// Returns a reporter that turns errors into a fatal shutdown while the
    /// engine waits in [`Self::run_until_signal`].
    #[must_use]
    pub fn fatal_reporter(&self) -> FatalReporter {
        self.coordinator.fatal_reporter()
    }

    /// Returns the engine health snapshot.
    pub async fn health(&self) -> HealthReport {
        self.operations.health().await
    }

    /// Runs the shutdown sequence.
    pub async fn shutdown(&self, reason: ShutdownReason) -> Option<ShutdownOutcome> {
        self.coordinator.shutdown(reason).await
    }

    /// Waits for SIGINT, SIGTERM, or a fatal report, then runs the shutdown
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while installing the signal handlers.
    pub async fn run_until_signal(&self) -> std::io::Result<Option<ShutdownOutcome>> {
        self.coordinator.run_until_signal().await
    }
}
