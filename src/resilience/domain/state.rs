//! Circuit breaker state machine.

use super::BreakerConfig;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    /// Calls flow through and failures are counted.
    Closed,
    /// Calls are rejected until the reset timeout elapses.
    Open,
    /// Trial calls are admitted; one failure reopens.
    HalfOpen,
}

impl BreakerState {
    /// Returns the canonical upper-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable breaker bookkeeping for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    state: BreakerState,
    failure_count: u32,
    failures: Vec<DateTime<Utc>>,
    last_failure_time: Option<DateTime<Utc>>,
    next_attempt_time: Option<DateTime<Utc>>,
    success_count: u32,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerState {
    /// Creates a closed breaker with no recorded failures.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            failures: Vec::new(),
            last_failure_time: None,
            next_attempt_time: None,
            success_count: 0,
        }
    }

    /// Returns the breaker position.
    #[must_use]
    pub const fn state(&self) -> BreakerState {
        self.state
    }

    /// Returns failures counted inside the monitoring window at the last
    /// recomputation.
    #[must_use]
    pub const fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Returns consecutive half-open successes.
    #[must_use]
    pub const fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Returns the time of the latest counted failure.
    #[must_use]
    pub const fn last_failure_time(&self) -> Option<DateTime<Utc>> {
        self.last_failure_time
    }

    /// Returns when an open breaker admits its next trial call.
    #[must_use]
    pub const fn next_attempt_time(&self) -> Option<DateTime<Utc>> {
        self.next_attempt_time
    }

    /// Decides whether a call may run at `now`.
    ///
    /// An open breaker whose reset timeout has elapsed moves to
    /// [`BreakerState::HalfOpen`] as a side effect.
    pub fn can_execute(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = self.next_attempt_time.is_none_or(|next| now >= next);
                if elapsed {
                    self.state = BreakerState::HalfOpen;
                    self.success_count = 0;
                }
                elapsed
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&mut self, config: &BreakerConfig) {
        self.failures.clear();
        self.failure_count = 0;
        if self.state == BreakerState::HalfOpen {
            self.success_count = self.success_count.saturating_add(1);
            if self.success_count >= config.success_threshold {
                self.close();
            }
        }
    }

    /// Records a failure that is not on the ignore list.
    pub fn record_failure(&mut self, now: DateTime<Utc>, config: &BreakerConfig) {
        self.failures.push(now);
        self.last_failure_time = Some(now);
        self.prune(now, config.monitoring_period);

        match self.state {
            BreakerState::HalfOpen => self.open(now, config.reset_timeout),
            BreakerState::Closed if self.failure_count >= config.failure_threshold => {
                self.open(now, config.reset_timeout);
            }
            BreakerState::Closed | BreakerState::Open => {}
        }
    }

    /// Opens the breaker regardless of failure counts.
    pub fn force_open(&mut self, now: DateTime<Utc>, reset_timeout: Duration) {
        self.open(now, reset_timeout);
    }

    /// Closes the breaker and clears failure history.
    pub fn force_close(&mut self) {
        self.close();
    }

    /// Returns the breaker to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Counts failures inside the window ending at `now`.
    #[must_use]
    pub fn recent_failures(&self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = shift(now, window, Direction::Back);
        self.failures.iter().filter(|at| **at > cutoff).count()
    }

    /// Builds a serializable health snapshot.
    #[must_use]
    pub fn status(&self, config: &BreakerConfig, now: DateTime<Utc>) -> BreakerStatus {
        let recent = self.recent_failures(now, config.monitoring_period);
        BreakerStatus {
            name: config.name.clone(),
            state: self.state,
            failure_count: self.failure_count,
            success_count: self.success_count,
            recent_failures: recent,
            failure_threshold: config.failure_threshold,
            last_failure_time: self.last_failure_time,
            next_attempt_time: self.next_attempt_time,
            failure_rate_per_minute: failure_rate(recent, config.monitoring_period),
        }
    }

    fn open(&mut self, now: DateTime<Utc>, reset_timeout: Duration) {
        self.state = BreakerState::Open;
        self.success_count = 0;
        self.next_attempt_time = Some(shift(now, reset_timeout, Direction::Forward));
    }

    fn close(&mut self) {
        self.state = BreakerState::Closed;
        self.failures.clear();
        self.failure_count = 0;
        self.success_count = 0;
        self.next_attempt_time = None;
    }

    fn prune(&mut self, now: DateTime<Utc>, window: Duration) {
        let cutoff = shift(now, window, Direction::Back);
        self.failures.retain(|at| *at > cutoff);
        self.failure_count = u32::try_from(self.failures.len()).unwrap_or(u32::MAX);
    }
}

/// Serializable breaker snapshot for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerStatus {
    /// Dependency name.
    pub name: String,
    /// Breaker position.
    pub state: BreakerState,
    /// Failures counted at the last recomputation.
    pub failure_count: u32,
    /// Consecutive half-open successes.
    pub success_count: u32,
    /// Failures inside the monitoring window right now.
    pub recent_failures: usize,
    /// Configured opening threshold.
    pub failure_threshold: u32,
    /// Time of the latest counted failure.
    pub last_failure_time: Option<DateTime<Utc>>,
    /// Earliest trial-call time while open.
    pub next_attempt_time: Option<DateTime<Utc>>,
    /// Recent failures per minute of monitoring window.
    pub failure_rate_per_minute: f64,
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Back,
}

fn shift(now: DateTime<Utc>, by: Duration, direction: Direction) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
    let shifted = match direction {
        Direction::Forward => now.checked_add_signed(delta),
        Direction::Back => now.checked_sub_signed(delta),
    };
    shifted.unwrap_or(match direction {
        Direction::Forward => DateTime::<Utc>::MAX_UTC,
        Direction::Back => DateTime::<Utc>::MIN_UTC,
    })
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "failure rate is a reporting ratio, precision loss is irrelevant"
)]
fn failure_rate(recent: usize, window: Duration) -> f64 {
    let minutes = window.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    recent as f64 / minutes
}
