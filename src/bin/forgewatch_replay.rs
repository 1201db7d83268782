//! Replays recorded webhook deliveries through the engine.
//!
//! Usage:
//!
//! ```text
//! forgewatch-replay [--hold] <recording.json>
//! ```
//!
//! The recording holds one delivery or an array of them:
//!
//! ```json
//! [
//!   {
//!     "event": "pull_request",
//!     "delivery_id": "72d3162e-cc78-11e3-81ab-4c9367dc0958",
//!     "payload": {"action": "opened", "pull_request": {"number": 12}}
//!   }
//! ]
//! ```
//!
//! Every adapter is in memory, so nothing leaves the process. The comments
//! the engine would have posted and the tasks it would have delegated are
//! logged. With `--hold` the engine stays up after the replay until SIGINT
//! or SIGTERM arrives. A failed replay or a panic anywhere in the engine
//! runs the same shutdown sequence with a fatal reason. The exit code is
//! that of the shutdown sequence.

use forgewatch::config::EngineConfig;
use forgewatch::replay::{Delivery, ReplayEngine, ReplaySummary};
use forgewatch::resilience::domain::BreakerState;
use forgewatch::runtime::domain::{ShutdownOutcome, ShutdownReason};
use forgewatch::runtime::services::{Supervised, report_panics};
use forgewatch::telemetry::init_tracing;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tokio::runtime::Builder;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the replay before the engine runs.
#[derive(Debug, Error)]
enum ReplayCliError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to read recording {path}: {source}")]
    RecordingRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recording: {0}")]
    RecordingParse(#[source] serde_json::Error),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
}

#[derive(Debug)]
struct Args {
    recording: PathBuf,
    hold: bool,
}

fn main() -> Result<ExitCode, BoxError> {
    let config = EngineConfig::from_env()?;
    init_tracing(&config.log_filter, config.log_format)?;
    let args = parse_args(env::args().skip(1))?;
    let deliveries = load_recording(&args.recording)?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ReplayCliError::RuntimeInit)?;
    let code = runtime.block_on(async {
        let engine = ReplayEngine::new(&config);
        report_panics(engine.fatal_reporter());
        let summary = match engine.replay_supervised(deliveries).await {
            Supervised::Completed(summary) => summary,
            Supervised::Aborted(outcome) => return Ok(exit_code(outcome.as_ref())),
        };
        log_summary(&summary);
        let health = engine.health().await;
        tracing::info!(
            status = ?health.status,
            active_tasks = health.active_tasks,
            open_breakers = health
                .breakers
                .iter()
                .filter(|breaker| breaker.state != BreakerState::Closed)
                .count(),
            "engine health"
        );

        let outcome = if args.hold {
            tracing::info!("replay finished, waiting for a termination signal");
            engine.run_until_signal().await?
        } else {
            engine.shutdown(ShutdownReason::Requested).await
        };
        Ok::<_, BoxError>(exit_code(outcome.as_ref()))
    })?;
    Ok(code)
}

fn exit_code(outcome: Option<&ShutdownOutcome>) -> ExitCode {
    let code = outcome.map_or(0, ShutdownOutcome::exit_code);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args, ReplayCliError> {
    let mut hold = false;
    let mut recording = None;
    for arg in args {
        match arg.as_str() {
            "--hold" => hold = true,
            flag if flag.starts_with("--") => {
                return Err(ReplayCliError::InvalidArgs(format!(
                    "unknown flag '{flag}'; expected --hold"
                )));
            }
            _ if recording.is_some() => {
                return Err(ReplayCliError::InvalidArgs(
                    "expected a single recording path".to_owned(),
                ));
            }
            path => recording = Some(PathBuf::from(path)),
        }
    }
    recording
        .map(|path| Args {
            recording: path,
            hold,
        })
        .ok_or_else(|| {
            ReplayCliError::InvalidArgs(
                "usage: forgewatch-replay [--hold] <recording.json>".to_owned(),
            )
        })
}

fn load_recording(path: &Path) -> Result<Vec<Delivery>, ReplayCliError> {
    let text = fs::read_to_string(path).map_err(|source| ReplayCliError::RecordingRead {
        path: path.to_path_buf(),
        source,
    })?;
    Delivery::parse_recording(&text).map_err(ReplayCliError::RecordingParse)
}

fn log_summary(summary: &ReplaySummary) {
    for comment in &summary.comments {
        tracing::info!(number = comment.number, body = %comment.body, "comment posted");
    }
    for task_type in &summary.executed {
        tracing::info!(%task_type, "task delegated");
    }
    tracing::info!(
        deliveries = summary.responses.len(),
        rejected = summary.responses.iter().filter(|status| **status != 202).count(),
        handled = summary.handled,
        ignored = summary.ignored.len(),
        dead_lettered = summary.dead_lettered,
        "replay finished"
    );
}

#[cfg(test)]
mod tests {
    use super::{ReplayCliError, parse_args};
    use rstest::rstest;
    use std::path::PathBuf;

    fn args(line: &str) -> impl Iterator<Item = String> {
        line.split_whitespace()
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[rstest]
    #[case("deliveries.json", false)]
    #[case("--hold deliveries.json", true)]
    #[case("deliveries.json --hold", true)]
    fn accepts_a_recording_path(#[case] line: &str, #[case] hold: bool) {
        let parsed =
            parse_args(args(line)).unwrap_or_else(|err| panic!("args should parse: {err}"));

        assert_eq!(parsed.recording, PathBuf::from("deliveries.json"));
        assert_eq!(parsed.hold, hold);
    }

    #[rstest]
    #[case("")]
    #[case("--verbose deliveries.json")]
    #[case("one.json two.json")]
    fn rejects_malformed_arguments(#[case] line: &str) {
        assert!(matches!(
            parse_args(args(line)),
            Err(ReplayCliError::InvalidArgs(_))
        ));
    }
}
