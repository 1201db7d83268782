//! Logging consumer for task lifecycle notifications.

use crate::delegation::domain::TaskEvent;
use tokio::sync::broadcast::{Receiver, error::RecvError};

/// Logs task events until the delegator is dropped.
///
/// Returns the number of events consumed.
pub async fn log_task_events(mut events: Receiver<TaskEvent>) -> usize {
    let mut consumed = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                consumed += 1;
                match event {
                    TaskEvent::Started {
                        task_id,
                        task_type,
                        correlation_id,
                    } => tracing::info!(%task_id, %task_type, correlation = %correlation_id, "task started"),
                    TaskEvent::Completed {
                        task_id,
                        duration_ms,
                    } => tracing::info!(%task_id, duration_ms, "task finished"),
                    TaskEvent::Failed { task_id, error } => {
                        tracing::warn!(%task_id, %error, "task finished with failure");
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "task event logger lagged behind");
            }
            Err(RecvError::Closed) => return consumed,
        }
    }
}
