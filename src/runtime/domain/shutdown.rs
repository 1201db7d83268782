//! Shutdown reasons, steps, and outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the process is shutting down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ShutdownReason {
    /// SIGINT or Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Unrecoverable runtime error.
    Fatal(String),
    /// Requested through the operations surface.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("interrupt"),
            Self::Terminate => f.write_str("terminate"),
            Self::Fatal(message) => write!(f, "fatal error: {message}"),
            Self::Requested => f.write_str("requested"),
        }
    }
}

/// Ordered steps of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownStep {
    /// Stop admitting webhook work.
    StopAdmission,
    /// Let queued jobs finish.
    DrainQueue,
    /// Close shared connections.
    ReleaseConnections,
}

impl ShutdownStep {
    /// Steps in execution order.
    pub const SEQUENCE: [Self; 3] = [
        Self::StopAdmission,
        Self::DrainQueue,
        Self::ReleaseConnections,
    ];

    /// Returns the snake-case step name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StopAdmission => "stop_admission",
            Self::DrainQueue => "drain_queue",
            Self::ReleaseConnections => "release_connections",
        }
    }
}

impl fmt::Display for ShutdownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shutdown step that returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Failed step.
    pub step: ShutdownStep,
    /// Rendered error.
    pub message: String,
}

/// Result of one shutdown run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownOutcome {
    /// Trigger of the run.
    pub reason: ShutdownReason,
    /// Steps that finished without error, in order.
    pub completed: Vec<ShutdownStep>,
    /// Steps that returned an error.
    pub failed: Vec<StepFailure>,
    /// Whether the hard ceiling cut the sequence short.
    pub timed_out: bool,
}

impl ShutdownOutcome {
    /// Returns `true` when every step finished inside the ceiling.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.timed_out && self.failed.is_empty()
    }

    /// Returns the process exit code: `0` for a clean run, `1` otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_clean())
    }
}
