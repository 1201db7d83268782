//! Bounded in-memory webhook queue.

use crate::runtime::{
    domain::{QueueStats, QueueStatus, WebhookJob},
    ports::{QueueError, QueueResult, WebhookQueue},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Bounded FIFO queue.
///
/// Workers pull jobs with [`InMemoryWebhookQueue::next_job`] and report back
/// with [`InMemoryWebhookQueue::finish`]. Draining closes the queue and
/// hands every waiting job to [`InMemoryWebhookQueue::drained`].
#[derive(Debug, Clone)]
pub struct InMemoryWebhookQueue {
    state: Arc<Mutex<QueueState>>,
}

#[derive(Debug)]
struct QueueState {
    capacity: usize,
    waiting: VecDeque<WebhookJob>,
    drained: Vec<WebhookJob>,
    active: usize,
    completed: usize,
    failed: usize,
    paused: bool,
    closed: bool,
    drain_delay: Duration,
    drain_failure: Option<String>,
}

impl InMemoryWebhookQueue {
    /// Creates a queue holding at most `capacity` waiting jobs.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                capacity,
                waiting: VecDeque::new(),
                drained: Vec::new(),
                active: 0,
                completed: 0,
                failed: 0,
                paused: false,
                closed: false,
                drain_delay: Duration::ZERO,
                drain_failure: None,
            })),
        }
    }

    /// Makes [`WebhookQueue::drain`] sleep before returning.
    #[must_use]
    pub fn with_drain_delay(self, delay: Duration) -> Self {
        self.lock().drain_delay = delay;
        self
    }

    /// Makes [`WebhookQueue::drain`] fail with `message`.
    #[must_use]
    pub fn with_drain_failure(self, message: impl Into<String>) -> Self {
        self.lock().drain_failure = Some(message.into());
        self
    }

    /// Takes the oldest waiting job unless the queue is paused.
    #[must_use]
    pub fn next_job(&self) -> Option<WebhookJob> {
        let mut state = self.lock();
        if state.paused {
            return None;
        }
        let job = state.waiting.pop_front()?;
        state.active += 1;
        Some(job)
    }

    /// Records the end of a job taken with [`Self::next_job`].
    pub fn finish(&self, succeeded: bool) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
        if succeeded {
            state.completed += 1;
        } else {
            state.failed += 1;
        }
    }

    /// Returns jobs handed over by the last drain.
    #[must_use]
    pub fn drained(&self) -> Vec<WebhookJob> {
        self.lock().drained.clone()
    }

    /// Returns whether the queue has been closed by a drain.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WebhookQueue for InMemoryWebhookQueue {
    async fn add_webhook_job(&self, job: WebhookJob) -> QueueResult<QueueStatus> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.waiting.len() >= state.capacity {
            return Err(QueueError::Overloaded {
                waiting: state.waiting.len(),
                capacity: state.capacity,
            });
        }
        let job_id = job.id;
        state.waiting.push_back(job);
        Ok(QueueStatus {
            job_id,
            depth: state.waiting.len(),
        })
    }

    async fn queue_stats(&self) -> QueueResult<QueueStats> {
        let state = self.lock();
        Ok(QueueStats {
            waiting: state.waiting.len(),
            active: state.active,
            completed: state.completed,
            failed: state.failed,
            capacity: state.capacity,
            paused: state.paused,
        })
    }

    async fn drain(&self) -> QueueResult<usize> {
        let (delay, failure) = {
            let mut state = self.lock();
            state.closed = true;
            (state.drain_delay, state.drain_failure.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = failure {
            return Err(QueueError::backend(std::io::Error::other(message)));
        }
        let mut state = self.lock();
        let pending: Vec<WebhookJob> = state.waiting.drain(..).collect();
        let count = pending.len();
        state.completed += count;
        state.drained.extend(pending);
        Ok(count)
    }

    async fn pause(&self) -> QueueResult<()> {
        self.lock().paused = true;
        Ok(())
    }

    async fn resume(&self) -> QueueResult<()> {
        self.lock().paused = false;
        Ok(())
    }
}
