//! Shared helpers for unit tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::resilience::domain::DependencyError;

/// Clock whose time only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock fixed at 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::zero());
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configurable dependency error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FakeDependencyError {
    pub message: String,
    pub code: Option<String>,
    pub transient: bool,
}

impl FakeDependencyError {
    pub fn transient(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            code: None,
            transient: true,
        }
    }

    pub fn permanent(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            code: None,
            transient: false,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_owned());
        self
    }
}

impl DependencyError for FakeDependencyError {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn is_transient(&self) -> bool {
        self.transient
    }
}
