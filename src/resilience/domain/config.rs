//! Breaker thresholds, ignore lists, and retry policies.

use super::DependencyError;
use regex::Regex;
use std::time::Duration;

/// Number of consecutive half-open successes required to close a breaker.
const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;

/// Error matcher for failures a breaker must ignore entirely.
#[derive(Debug, Clone)]
pub enum ExpectedError {
    /// Matches when the rendered error message contains the text.
    Message(String),
    /// Matches when the error reports exactly this code.
    Code(String),
    /// Matches when the rendered error message matches the pattern.
    Pattern(Regex),
}

impl ExpectedError {
    /// Returns whether `error` is covered by this matcher.
    #[must_use]
    pub fn matches<E: DependencyError>(&self, error: &E) -> bool {
        match self {
            Self::Message(text) => error.to_string().contains(text.as_str()),
            Self::Code(code) => error.code().is_some_and(|actual| actual == code),
            Self::Pattern(pattern) => pattern.is_match(&error.to_string()),
        }
    }
}

/// Configuration of a single circuit breaker.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Dependency name used in logs and health snapshots.
    pub name: String,
    /// Failures inside the monitoring window that open the breaker.
    pub failure_threshold: u32,
    /// Cool-down before an open breaker admits a trial call.
    pub reset_timeout: Duration,
    /// Sliding window over which failures are counted.
    pub monitoring_period: Duration,
    /// Consecutive half-open successes that close the breaker.
    pub success_threshold: u32,
    /// Failures that never affect breaker state.
    pub expected_errors: Vec<ExpectedError>,
}

impl BreakerConfig {
    /// Creates a configuration with the default half-open success threshold
    /// and an empty ignore list.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        reset_timeout: Duration,
        monitoring_period: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            reset_timeout,
            monitoring_period,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            expected_errors: Vec::new(),
        }
    }

    /// Adds an ignore-list entry.
    #[must_use]
    pub fn with_expected_error(mut self, expected: ExpectedError) -> Self {
        self.expected_errors.push(expected);
        self
    }

    /// Returns whether `error` is on the ignore list.
    #[must_use]
    pub fn is_expected<E: DependencyError>(&self, error: &E) -> bool {
        self.expected_errors
            .iter()
            .any(|expected| expected.matches(error))
    }
}

/// Bounded exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Policy applied to GitHub REST calls.
    #[must_use]
    pub const fn github() -> Self {
        Self::new(3, Duration::from_millis(1_000), Duration::from_millis(5_000))
    }

    /// Policy applied to AI service calls.
    #[must_use]
    pub const fn ai() -> Self {
        Self::new(2, Duration::from_millis(2_000), Duration::from_millis(10_000))
    }

    /// Returns the delay applied before retry number `attempt` (zero based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
