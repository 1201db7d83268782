//! Engine configuration.
//!
//! Defaults describe a production deployment; every field can be overridden
//! through a `FORGEWATCH_`-prefixed environment variable, e.g.
//! `FORGEWATCH_QUEUE_CAPACITY=500`.

use crate::resilience::domain::BreakerConfig;
use crate::runtime::services::DEFAULT_SHUTDOWN_CEILING;
use crate::workflow::services::{ai_breaker_config, github_breaker_config};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "FORGEWATCH_";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// Breaker thresholds for one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Failures inside the monitoring window that open the breaker.
    pub failure_threshold: u32,
    /// Seconds an open breaker waits before a trial call.
    pub reset_timeout_secs: u64,
    /// Length of the failure window in seconds.
    pub monitoring_period_secs: u64,
}

impl BreakerSettings {
    const fn from_config(config: &BreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            reset_timeout_secs: config.reset_timeout.as_secs(),
            monitoring_period_secs: config.monitoring_period.as_secs(),
        }
    }

    const fn apply(self, mut config: BreakerConfig) -> BreakerConfig {
        config.failure_threshold = self.failure_threshold;
        config.reset_timeout = Duration::from_secs(self.reset_timeout_secs);
        config.monitoring_period = Duration::from_secs(self.monitoring_period_secs);
        config
    }
}

/// Runtime settings of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether agent work is enabled at start-up.
    pub agents_enabled: bool,
    /// Webhook jobs the queue holds before admission reports overload.
    pub queue_capacity: usize,
    /// Hard ceiling for the shutdown sequence, in seconds.
    pub shutdown_timeout_secs: u64,
    /// GitHub breaker thresholds.
    pub github: BreakerSettings,
    /// AI breaker thresholds.
    pub ai: BreakerSettings,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agents_enabled: true,
            queue_capacity: 1_000,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_CEILING.as_secs(),
            github: BreakerSettings::from_config(&github_breaker_config()),
            ai: BreakerSettings::from_config(&ai_breaker_config()),
            log_filter: "info".to_owned(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        /// Full variable name.
        key: String,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl EngineConfig {
    /// Loads defaults overridden by `FORGEWATCH_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads defaults overridden by values from `lookup`, which receives
    /// full variable names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let overrides = Overrides { lookup: &lookup };
        let mut config = Self::default();
        overrides.set("AGENTS_ENABLED", &mut config.agents_enabled)?;
        overrides.set("QUEUE_CAPACITY", &mut config.queue_capacity)?;
        overrides.set("SHUTDOWN_TIMEOUT_SECS", &mut config.shutdown_timeout_secs)?;
        overrides.set("GITHUB_FAILURE_THRESHOLD", &mut config.github.failure_threshold)?;
        overrides.set("GITHUB_RESET_TIMEOUT_SECS", &mut config.github.reset_timeout_secs)?;
        overrides.set(
            "GITHUB_MONITORING_PERIOD_SECS",
            &mut config.github.monitoring_period_secs,
        )?;
        overrides.set("AI_FAILURE_THRESHOLD", &mut config.ai.failure_threshold)?;
        overrides.set("AI_RESET_TIMEOUT_SECS", &mut config.ai.reset_timeout_secs)?;
        overrides.set("AI_MONITORING_PERIOD_SECS", &mut config.ai.monitoring_period_secs)?;
        overrides.set("LOG_FILTER", &mut config.log_filter)?;
        overrides.set("LOG_FORMAT", &mut config.log_format)?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Returns the shutdown ceiling.
    #[must_use]
    pub const fn shutdown_ceiling(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the GitHub breaker configuration with these thresholds.
    #[must_use]
    pub fn github_breaker(&self) -> BreakerConfig {
        self.github.apply(github_breaker_config())
    }

    /// Returns the AI breaker configuration with these thresholds.
    #[must_use]
    pub fn ai_breaker(&self) -> BreakerConfig {
        self.ai.apply(ai_breaker_config())
    }
}

struct Overrides<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    lookup: &'a F,
}

impl<F> Overrides<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn set<T>(&self, name: &str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let key = format!("{ENV_PREFIX}{name}");
        let Some(value) = (self.lookup)(&key) else {
            return Ok(());
        };
        *target = value
            .trim()
            .parse()
            .map_err(|error: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: error.to_string(),
            })?;
        Ok(())
    }
}
