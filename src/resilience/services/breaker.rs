//! Shared, clock-driven circuit breaker.

use crate::resilience::domain::{
    BreakerConfig, BreakerOpen, BreakerState, BreakerStatus, CircuitBreakerState, CircuitError,
    DependencyError,
};
use mockable::Clock;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Circuit breaker guarding one dependency.
///
/// State lives behind a mutex and is shared by every caller of the
/// dependency within this process.
pub struct CircuitBreaker<C>
where
    C: Clock + Send + Sync,
{
    config: BreakerConfig,
    clock: Arc<C>,
    state: Mutex<CircuitBreakerState>,
}

impl<C> CircuitBreaker<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a closed breaker.
    #[must_use]
    pub const fn new(config: BreakerConfig, clock: Arc<C>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(CircuitBreakerState::new()),
        }
    }

    /// Returns the breaker configuration.
    #[must_use]
    pub const fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Returns the dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the current breaker position.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.lock().state()
    }

    /// Decides whether a call may run now, moving an expired open breaker
    /// to half-open.
    #[must_use]
    pub fn can_execute(&self) -> bool {
        let now = self.clock.utc();
        let mut state = self.lock();
        let before = state.state();
        let allowed = state.can_execute(now);
        if before != state.state() {
            tracing::info!(breaker = %self.config.name, "circuit breaker half-open, admitting trial call");
        }
        allowed
    }

    /// Records a successful call.
    pub fn on_success(&self) {
        let mut state = self.lock();
        let before = state.state();
        state.record_success(&self.config);
        if before != BreakerState::Closed && state.state() == BreakerState::Closed {
            tracing::info!(breaker = %self.config.name, "circuit breaker closed");
        }
    }

    /// Records a failed call unless the error is on the ignore list.
    pub fn on_failure<E: DependencyError>(&self, error: &E) {
        if self.config.is_expected(error) {
            tracing::debug!(breaker = %self.config.name, %error, "ignoring expected error");
            return;
        }
        let now = self.clock.utc();
        let mut state = self.lock();
        let before = state.state();
        state.record_failure(now, &self.config);
        if before != BreakerState::Open && state.state() == BreakerState::Open {
            tracing::warn!(
                breaker = %self.config.name,
                failures = state.failure_count(),
                next_attempt = ?state.next_attempt_time(),
                %error,
                "circuit breaker opened"
            );
        }
    }

    /// Runs `operation` when the breaker admits calls.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Open`] without running the operation while the
    /// breaker rejects calls, or [`CircuitError::Operation`] with the
    /// operation's own failure.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitError<E>>
    where
        E: DependencyError,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.can_execute() {
            return Err(CircuitError::Open(self.rejection()));
        }
        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure(&error);
                Err(CircuitError::Operation(error))
            }
        }
    }

    /// Opens the breaker immediately.
    pub fn force_open(&self) {
        let now = self.clock.utc();
        self.lock().force_open(now, self.config.reset_timeout);
        tracing::warn!(breaker = %self.config.name, "circuit breaker forced open");
    }

    /// Closes the breaker immediately.
    pub fn force_close(&self) {
        self.lock().force_close();
        tracing::info!(breaker = %self.config.name, "circuit breaker forced closed");
    }

    /// Returns the breaker to its initial state.
    pub fn reset(&self) {
        self.lock().reset();
        tracing::info!(breaker = %self.config.name, "circuit breaker reset");
    }

    /// Returns a serializable health snapshot.
    #[must_use]
    pub fn status(&self) -> BreakerStatus {
        let now = self.clock.utc();
        self.lock().status(&self.config, now)
    }

    fn rejection(&self) -> BreakerOpen {
        let state = self.lock();
        BreakerOpen {
            name: self.config.name.clone(),
            state: state.state(),
            next_attempt_time: state.next_attempt_time(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitBreakerState> {
        // No mutation can panic half-way, so a poisoned state is still whole.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs `operation` through `breaker`.
///
/// # Errors
///
/// See [`CircuitBreaker::execute`].
pub async fn with_breaker<C, T, E, F, Fut>(
    breaker: &CircuitBreaker<C>,
    operation: F,
) -> Result<T, CircuitError<E>>
where
    C: Clock + Send + Sync,
    E: DependencyError,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    breaker.execute(operation).await
}
