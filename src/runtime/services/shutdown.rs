//! Single-flight, ordered process shutdown.

use crate::runtime::{
    domain::{ShutdownOutcome, ShutdownReason, ShutdownStep, StepFailure},
    ports::ShutdownHooks,
};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::{
    signal,
    sync::{Mutex as AsyncMutex, mpsc, watch},
};

/// Hard ceiling for the whole shutdown sequence.
pub const DEFAULT_SHUTDOWN_CEILING: Duration = Duration::from_secs(30);

/// Read side of the shutdown flag.
///
/// Handles are cheap to clone and gate webhook admission and periodic work.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    receiver: watch::Receiver<bool>,
}

impl ShutdownHandle {
    /// Creates a handle that never observes a shutdown.
    #[must_use]
    pub fn detached() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    /// Returns whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has begun. Never resolves for a detached
    /// handle.
    pub async fn wait(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|shutting_down| *shutting_down).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    completed: Vec<ShutdownStep>,
    failed: Vec<StepFailure>,
}

/// Reports unrecoverable errors to a [`ShutdownCoordinator`].
///
/// Reports may come from any thread, including a panic hook. The
/// coordinator turns the first one into a fatal shutdown while it waits in
/// [`ShutdownCoordinator::run_until_signal`].
#[derive(Debug, Clone)]
pub struct FatalReporter {
    sender: mpsc::UnboundedSender<String>,
}

impl FatalReporter {
    /// Reports a fatal error.
    pub fn report(&self, message: impl Into<String>) {
        let text: String = message.into();
        tracing::error!(message = %text, "fatal error reported");
        if self.sender.send(text).is_err() {
            tracing::debug!("shutdown coordinator gone, fatal report dropped");
        }
    }

    /// Spawns `future`, reporting a panic inside it as fatal.
    pub fn spawn_supervised<F>(&self, name: &'static str, future: F)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let reporter = self.clone();
        tokio::spawn(async move {
            if let Err(error) = tokio::spawn(future).await {
                if error.is_panic() {
                    let message = panic_message(error.into_panic().as_ref());
                    reporter.report(format!("task '{name}' panicked: {message}"));
                } else {
                    tracing::debug!(task = name, "supervised task cancelled");
                }
            }
        });
    }
}

/// Chains a panic hook that reports every panic to `reporter`.
///
/// The previously installed hook still runs first.
pub fn report_panics(reporter: FatalReporter) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        previous(info);
        reporter.report(format!("panic: {info}"));
    }));
}

/// Result of [`ShutdownCoordinator::supervise`].
#[derive(Debug)]
#[must_use]
pub enum Supervised<T> {
    /// The work finished.
    Completed(T),
    /// The work failed or panicked and a fatal shutdown ran.
    ///
    /// Holds `None` when a shutdown was already under way.
    Aborted(Option<ShutdownOutcome>),
}

/// Owns the shutdown flag and runs the drain sequence once.
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
    hooks: Arc<dyn ShutdownHooks>,
    ceiling: Duration,
    fatal_sender: mpsc::UnboundedSender<String>,
    fatal_receiver: AsyncMutex<mpsc::UnboundedReceiver<String>>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator that has not begun shutting down.
    #[must_use]
    pub fn new(hooks: Arc<dyn ShutdownHooks>, ceiling: Duration) -> Self {
        let (sender, _receiver) = watch::channel(false);
        let (fatal_sender, fatal_receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            hooks,
            ceiling,
            fatal_sender,
            fatal_receiver: AsyncMutex::new(fatal_receiver),
        }
    }

    /// Returns a reporter feeding fatal errors to this coordinator.
    #[must_use]
    pub fn fatal_reporter(&self) -> FatalReporter {
        FatalReporter {
            sender: self.fatal_sender.clone(),
        }
    }

    /// Returns a new handle observing this coordinator.
    #[must_use]
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            receiver: self.sender.subscribe(),
        }
    }

    /// Returns whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.sender.borrow()
    }

    /// Runs the ordered shutdown sequence.
    ///
    /// Returns `None` when a shutdown is already under way; the request is
    /// only logged. A failing step is logged and the remaining steps still
    /// run. Steps still running when the ceiling elapses are abandoned.
    pub async fn shutdown(&self, reason: ShutdownReason) -> Option<ShutdownOutcome> {
        if self.sender.send_replace(true) {
            tracing::warn!(%reason, "shutdown already in progress, ignoring request");
            return None;
        }
        tracing::info!(%reason, ceiling_secs = self.ceiling.as_secs(), "shutdown started");

        let progress = Mutex::new(Progress::default());
        let timed_out = tokio::time::timeout(self.ceiling, self.run_steps(&progress))
            .await
            .is_err();
        let Progress { completed, failed } =
            progress.into_inner().unwrap_or_else(PoisonError::into_inner);
        let outcome = ShutdownOutcome {
            reason,
            completed,
            failed,
            timed_out,
        };

        if timed_out {
            tracing::error!(
                completed = outcome.completed.len(),
                "shutdown exceeded its ceiling, forcing exit"
            );
        } else if outcome.is_clean() {
            tracing::info!("shutdown complete");
        } else {
            tracing::error!(failed = outcome.failed.len(), "shutdown finished with failures");
        }
        Some(outcome)
    }

    /// Waits for SIGINT, SIGTERM, or a fatal report, then shuts down.
    ///
    /// Returns `None` when another caller started the shutdown first.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while installing the signal handlers.
    pub async fn run_until_signal(&self) -> std::io::Result<Option<ShutdownOutcome>> {
        let reason = tokio::select! {
            signalled = listen_for_signals() => signalled?,
            message = self.next_fatal() => ShutdownReason::Fatal(message),
        };
        Ok(self.shutdown(reason).await)
    }

    /// Runs `work`, starting a fatal shutdown when it fails or panics.
    pub async fn supervise<T, E, F>(&self, work: F) -> Supervised<T>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        let message = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(value)) => return Supervised::Completed(value),
            Ok(Err(error)) => error.to_string(),
            Err(payload) => format!("panic: {}", panic_message(payload.as_ref())),
        };
        tracing::error!(%message, "supervised work failed, shutting down");
        Supervised::Aborted(self.shutdown(ShutdownReason::Fatal(message)).await)
    }

    async fn next_fatal(&self) -> String {
        let mut receiver = self.fatal_receiver.lock().await;
        if let Some(message) = receiver.recv().await {
            return message;
        }
        std::future::pending().await
    }

    async fn run_steps(&self, progress: &Mutex<Progress>) {
        for step in ShutdownStep::SEQUENCE {
            tracing::info!(%step, "running shutdown step");
            let result = match step {
                ShutdownStep::StopAdmission => self.hooks.stop_admission().await,
                ShutdownStep::DrainQueue => self.hooks.drain_queue().await,
                ShutdownStep::ReleaseConnections => self.hooks.release_connections().await,
            };
            let mut recorded = progress.lock().unwrap_or_else(PoisonError::into_inner);
            match result {
                Ok(()) => recorded.completed.push(step),
                Err(error) => {
                    tracing::error!(%step, %error, "shutdown step failed");
                    recorded.failed.push(StepFailure {
                        step,
                        message: error.to_string(),
                    });
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Waits for SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// # Errors
///
/// Returns the I/O error raised while installing the signal handlers.
pub async fn listen_for_signals() -> std::io::Result<ShutdownReason> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                tracing::info!("received Ctrl+C");
                Ok(ShutdownReason::Interrupt)
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM");
                Ok(ShutdownReason::Terminate)
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        tracing::info!("received Ctrl+C");
        Ok(ShutdownReason::Interrupt)
    }
}
