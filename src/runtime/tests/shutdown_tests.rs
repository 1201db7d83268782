//! Shutdown coordinator tests.

use std::sync::Arc;
use std::time::Duration;

use crate::runtime::{
    adapters::memory::{InMemoryConnection, InMemoryWebhookQueue},
    domain::{ShutdownReason, ShutdownStep, WebhookJob},
    ports::{ShutdownHookError, ShutdownHooks, WebhookQueue},
    services::{QueueShutdownHooks, ShutdownCoordinator, ShutdownHandle, Supervised},
};
use async_trait::async_trait;
use chrono::Utc;
use rstest::rstest;
use serde_json::json;

mockall::mock! {
    Hooks {}

    #[async_trait]
    impl ShutdownHooks for Hooks {
        async fn stop_admission(&self) -> Result<(), ShutdownHookError>;
        async fn drain_queue(&self) -> Result<(), ShutdownHookError>;
        async fn release_connections(&self) -> Result<(), ShutdownHookError>;
    }
}

async fn queue_with_jobs(count: usize) -> InMemoryWebhookQueue {
    let queue = InMemoryWebhookQueue::new(10);
    for delivery in 0..count {
        let job = WebhookJob::new(
            "issues",
            Some(format!("delivery-{delivery}")),
            json!({}),
            Utc::now(),
        );
        queue
            .add_webhook_job(job)
            .await
            .unwrap_or_else(|err| panic!("job should queue: {err}"));
    }
    queue
}

#[rstest]
#[tokio::test]
async fn shutdown_runs_steps_in_order_and_exits_cleanly() {
    let queue = queue_with_jobs(2).await;
    let connection = Arc::new(InMemoryConnection::new("redis"));
    let hooks = QueueShutdownHooks::new(Arc::new(queue.clone())).with_connection(connection.clone());
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1));

    let outcome = coordinator
        .shutdown(ShutdownReason::Terminate)
        .await
        .unwrap_or_else(|| panic!("first shutdown should run"));

    assert_eq!(outcome.completed, ShutdownStep::SEQUENCE.to_vec());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(queue.drained().len(), 2);
    assert!(queue.is_closed());
    assert!(connection.is_closed());
}

#[rstest]
#[tokio::test]
async fn second_request_is_a_no_op() {
    let mut hooks = MockHooks::new();
    hooks.expect_stop_admission().times(1).returning(|| Ok(()));
    hooks.expect_drain_queue().times(1).returning(|| Ok(()));
    hooks.expect_release_connections().times(1).returning(|| Ok(()));
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1));

    let first = coordinator.shutdown(ShutdownReason::Interrupt).await;
    let second = coordinator.shutdown(ShutdownReason::Terminate).await;

    assert!(first.is_some());
    assert!(second.is_none());
}

#[rstest]
#[tokio::test]
async fn failing_step_does_not_stop_later_steps() {
    let queue = InMemoryWebhookQueue::new(4).with_drain_failure("redis went away");
    let connection = Arc::new(InMemoryConnection::new("redis"));
    let hooks = QueueShutdownHooks::new(Arc::new(queue)).with_connection(connection.clone());
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1));

    let outcome = coordinator
        .shutdown(ShutdownReason::Fatal("boom".to_owned()))
        .await
        .unwrap_or_else(|| panic!("first shutdown should run"));

    assert_eq!(
        outcome.completed,
        vec![ShutdownStep::StopAdmission, ShutdownStep::ReleaseConnections]
    );
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed.iter().all(|failure| failure.step == ShutdownStep::DrainQueue));
    assert!(connection.is_closed());
    assert_eq!(outcome.exit_code(), 1);
}

#[rstest]
#[tokio::test]
async fn connection_failures_are_reported() {
    let hooks = QueueShutdownHooks::new(Arc::new(InMemoryWebhookQueue::new(4)))
        .with_connection(Arc::new(InMemoryConnection::new("db")))
        .with_connection(Arc::new(InMemoryConnection::failing("redis", "socket reset")));
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1));

    let outcome = coordinator
        .shutdown(ShutdownReason::Terminate)
        .await
        .unwrap_or_else(|| panic!("first shutdown should run"));

    let messages: Vec<&str> = outcome.failed.iter().map(|failure| failure.message.as_str()).collect();
    assert_eq!(messages, vec!["failed to close redis: socket reset"]);
}

#[rstest]
#[tokio::test]
async fn stalled_sequence_hits_the_ceiling() {
    let queue = InMemoryWebhookQueue::new(4).with_drain_delay(Duration::from_millis(500));
    let hooks = QueueShutdownHooks::new(Arc::new(queue));
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_millis(50));

    let outcome = coordinator
        .shutdown(ShutdownReason::Terminate)
        .await
        .unwrap_or_else(|| panic!("first shutdown should run"));

    assert!(outcome.timed_out);
    assert_eq!(outcome.completed, vec![ShutdownStep::StopAdmission]);
    assert_eq!(outcome.exit_code(), 1);
}

#[rstest]
#[tokio::test]
async fn handles_observe_the_flag() {
    let hooks = QueueShutdownHooks::new(Arc::new(InMemoryWebhookQueue::new(1)));
    let coordinator = ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1));
    let handle = coordinator.handle();
    assert!(!handle.is_shutting_down());

    let waiter = handle.clone();
    let (outcome, ()) = tokio::join!(coordinator.shutdown(ShutdownReason::Requested), waiter.wait());

    assert!(outcome.is_some());
    assert!(handle.is_shutting_down());
    assert!(coordinator.is_shutting_down());
}

#[rstest]
#[tokio::test]
async fn detached_handle_never_fires() {
    let handle = ShutdownHandle::detached();

    let waited = tokio::time::timeout(Duration::from_millis(20), handle.wait()).await;

    assert!(waited.is_err());
    assert!(!handle.is_shutting_down());
}

fn plain_coordinator() -> (InMemoryWebhookQueue, ShutdownCoordinator) {
    let queue = InMemoryWebhookQueue::new(4);
    let hooks = QueueShutdownHooks::new(Arc::new(queue.clone()));
    (queue, ShutdownCoordinator::new(Arc::new(hooks), Duration::from_secs(1)))
}

#[rstest]
#[tokio::test]
async fn supervised_success_leaves_the_engine_running() {
    let (queue, coordinator) = plain_coordinator();

    let result = coordinator.supervise(async { Ok::<_, String>(7) }).await;

    assert!(matches!(result, Supervised::Completed(7)));
    assert!(!coordinator.is_shutting_down());
    assert!(!queue.is_closed());
}

#[rstest]
#[tokio::test]
async fn supervised_error_runs_a_fatal_shutdown() {
    let (queue, coordinator) = plain_coordinator();

    let result = coordinator
        .supervise(async { Err::<u8, _>("queue backend lost") })
        .await;

    let Supervised::Aborted(Some(outcome)) = result else {
        panic!("a failed run should shut down");
    };
    assert_eq!(
        outcome.reason,
        ShutdownReason::Fatal("queue backend lost".to_owned())
    );
    assert_eq!(outcome.completed, ShutdownStep::SEQUENCE.to_vec());
    assert!(queue.is_closed());
}

#[rstest]
#[tokio::test]
async fn supervised_panic_runs_a_fatal_shutdown() {
    let (queue, coordinator) = plain_coordinator();
    let explode = true;

    let result = coordinator
        .supervise(async move {
            if explode {
                panic!("router exploded");
            }
            Ok::<u8, String>(1)
        })
        .await;

    let Supervised::Aborted(Some(outcome)) = result else {
        panic!("a panicking run should shut down");
    };
    assert_eq!(
        outcome.reason,
        ShutdownReason::Fatal("panic: router exploded".to_owned())
    );
    assert!(queue.is_closed());
    assert!(coordinator.is_shutting_down());
}

#[rstest]
#[tokio::test]
async fn fatal_report_ends_the_signal_wait() {
    let (_queue, coordinator) = plain_coordinator();
    coordinator.fatal_reporter().report("dead-letter store unreachable");

    let outcome = tokio::time::timeout(Duration::from_secs(1), coordinator.run_until_signal())
        .await
        .unwrap_or_else(|_| panic!("a fatal report should end the wait"))
        .unwrap_or_else(|err| panic!("signal handlers should install: {err}"))
        .unwrap_or_else(|| panic!("first shutdown should run"));

    assert_eq!(
        outcome.reason,
        ShutdownReason::Fatal("dead-letter store unreachable".to_owned())
    );
    assert_eq!(outcome.exit_code(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn panicking_background_task_triggers_shutdown() {
    let (queue, coordinator) = plain_coordinator();
    let explode = true;
    coordinator
        .fatal_reporter()
        .spawn_supervised("event logger", async move {
            if explode {
                panic!("subscriber lagged");
            }
        });

    let outcome = tokio::time::timeout(Duration::from_secs(1), coordinator.run_until_signal())
        .await
        .unwrap_or_else(|_| panic!("the panic should be reported"))
        .unwrap_or_else(|err| panic!("signal handlers should install: {err}"))
        .unwrap_or_else(|| panic!("first shutdown should run"));

    assert_eq!(
        outcome.reason,
        ShutdownReason::Fatal("task 'event logger' panicked: subscriber lagged".to_owned())
    );
    assert!(queue.is_closed());
}
