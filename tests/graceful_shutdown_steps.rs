//! Behavioural tests for single-flight graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, ensure, eyre};
use forgewatch::runtime::{
    adapters::memory::{InMemoryConnection, InMemoryWebhookQueue},
    domain::{ShutdownOutcome, ShutdownReason, ShutdownStep, WebhookJob},
    ports::WebhookQueue,
    services::{QueueShutdownHooks, ShutdownCoordinator, WebhookAdmission},
};
use mockable::DefaultClock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

struct ShutdownWorld {
    queue: InMemoryWebhookQueue,
    connection: Arc<InMemoryConnection>,
    coordinator: Option<ShutdownCoordinator>,
    outcomes: Vec<Option<ShutdownOutcome>>,
}

impl ShutdownWorld {
    fn new() -> Self {
        Self {
            queue: InMemoryWebhookQueue::new(10),
            connection: Arc::new(InMemoryConnection::new("github")),
            coordinator: None,
            outcomes: Vec::new(),
        }
    }

    fn start(&mut self, queue: InMemoryWebhookQueue, ceiling: Duration) {
        let hooks = QueueShutdownHooks::new(Arc::new(queue.clone()))
            .with_connection(Arc::clone(&self.connection) as _);
        self.coordinator = Some(ShutdownCoordinator::new(Arc::new(hooks), ceiling));
        self.queue = queue;
    }

    fn coordinator(&self) -> Result<&ShutdownCoordinator> {
        self.coordinator
            .as_ref()
            .ok_or_else(|| eyre!("engine not started"))
    }

    fn first_outcome(&self) -> Result<&ShutdownOutcome> {
        self.outcomes
            .first()
            .and_then(Option::as_ref)
            .ok_or_else(|| eyre!("first shutdown request produced no outcome"))
    }
}

fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

#[fixture]
fn world() -> ShutdownWorld {
    ShutdownWorld::new()
}

#[given("a running engine with {count} queued webhooks")]
fn engine_with_jobs(world: &mut ShutdownWorld, count: usize) -> Result<()> {
    let queue = InMemoryWebhookQueue::new(10);
    for index in 0..count {
        let job = WebhookJob::new(
            "ping",
            Some(format!("delivery-{index}")),
            json!({"zen": "Keep it logically awesome."}),
            chrono::Utc::now(),
        );
        run_async(queue.add_webhook_job(job))?;
    }
    world.start(queue, Duration::from_secs(5));
    Ok(())
}

#[given("a running engine whose queue drain fails")]
fn engine_with_failing_drain(world: &mut ShutdownWorld) {
    world.start(
        InMemoryWebhookQueue::new(10).with_drain_failure("redis connection reset"),
        Duration::from_secs(5),
    );
}

#[given(
    "a running engine whose queue drain takes {drain} milliseconds under a {ceiling} millisecond ceiling"
)]
fn engine_with_slow_drain(world: &mut ShutdownWorld, drain: u64, ceiling: u64) {
    world.start(
        InMemoryWebhookQueue::new(10).with_drain_delay(Duration::from_millis(drain)),
        Duration::from_millis(ceiling),
    );
}

#[when("termination is requested")]
fn request_termination(world: &mut ShutdownWorld) -> Result<()> {
    let outcome = run_async(world.coordinator()?.shutdown(ShutdownReason::Terminate));
    world.outcomes.push(outcome);
    Ok(())
}

#[when("termination is requested twice")]
fn request_termination_twice(world: &mut ShutdownWorld) -> Result<()> {
    let coordinator = world.coordinator()?;
    let (first, second) = run_async(async {
        tokio::join!(
            coordinator.shutdown(ShutdownReason::Terminate),
            coordinator.shutdown(ShutdownReason::Interrupt)
        )
    });
    world.outcomes = vec![first, second];
    Ok(())
}

#[then("the first request runs every shutdown step")]
fn every_step_ran(world: &ShutdownWorld) -> Result<()> {
    let outcome = world.first_outcome()?;
    ensure!(
        outcome.completed == ShutdownStep::SEQUENCE.to_vec(),
        "unexpected steps: {:?}",
        outcome.completed
    );
    ensure!(outcome.reason == ShutdownReason::Terminate, "wrong reason");
    Ok(())
}

#[then("the second request is ignored")]
fn second_request_ignored(world: &ShutdownWorld) -> Result<()> {
    ensure!(world.outcomes.len() == 2, "expected two requests");
    ensure!(
        world.outcomes.last().is_some_and(Option::is_none),
        "second request ran the sequence again"
    );
    Ok(())
}

#[then("{count} queued webhooks are handed over")]
fn jobs_handed_over(world: &ShutdownWorld, count: usize) -> Result<()> {
    ensure!(world.queue.is_closed(), "queue still open");
    ensure!(
        world.queue.drained().len() == count,
        "drained {} jobs",
        world.queue.drained().len()
    );
    Ok(())
}

#[then("the shutdown exits with code {code}")]
fn exits_with(world: &ShutdownWorld, code: i32) -> Result<()> {
    let outcome = world.first_outcome()?;
    ensure!(outcome.exit_code() == code, "exit code {}", outcome.exit_code());
    Ok(())
}

#[then("new webhooks are refused with status {status}")]
fn new_webhooks_refused(world: &ShutdownWorld, status: u16) -> Result<()> {
    let admission = WebhookAdmission::new(
        Arc::new(world.queue.clone()),
        world.coordinator()?.handle(),
        Arc::new(DefaultClock),
    );
    let decision = run_async(admission.admit("ping", Some("late"), json!({})))?;
    ensure!(
        decision.http_status() == status,
        "answered {}",
        decision.http_status()
    );
    Ok(())
}

#[then("the connections are released")]
fn connections_released(world: &ShutdownWorld) -> Result<()> {
    ensure!(world.connection.is_closed(), "connection left open");
    let outcome = world.first_outcome()?;
    ensure!(
        outcome.completed.contains(&ShutdownStep::ReleaseConnections),
        "release step did not complete"
    );
    Ok(())
}

#[then("the drain step is reported as failed")]
fn drain_failed(world: &ShutdownWorld) -> Result<()> {
    let outcome = world.first_outcome()?;
    ensure!(
        outcome
            .failed
            .iter()
            .any(|failure| failure.step == ShutdownStep::DrainQueue
                && failure.message.contains("redis connection reset")),
        "unexpected failures: {:?}",
        outcome.failed
    );
    Ok(())
}

#[then("the shutdown timed out")]
fn timed_out(world: &ShutdownWorld) -> Result<()> {
    let outcome = world.first_outcome()?;
    ensure!(outcome.timed_out, "sequence finished inside the ceiling");
    ensure!(
        !outcome.completed.contains(&ShutdownStep::ReleaseConnections),
        "release ran after the ceiling"
    );
    Ok(())
}

#[scenario(
    path = "tests/features/graceful_shutdown.feature",
    name = "A second termination signal does not drain again"
)]
#[tokio::test(flavor = "multi_thread")]
async fn second_signal_is_single_flight(world: ShutdownWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/graceful_shutdown.feature",
    name = "A failing drain still releases connections"
)]
#[tokio::test(flavor = "multi_thread")]
async fn failing_drain_releases_connections(world: ShutdownWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/graceful_shutdown.feature",
    name = "A hung drain is cut short by the ceiling"
)]
#[tokio::test(flavor = "multi_thread")]
async fn hung_drain_hits_ceiling(world: ShutdownWorld) {
    let _ = world;
}
