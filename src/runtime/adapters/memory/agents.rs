//! Process-local agent toggle.

use crate::runtime::ports::AgentToggle;
use std::sync::atomic::{AtomicBool, Ordering};

/// Agent toggle held in an atomic flag.
#[derive(Debug)]
pub struct InMemoryAgentToggle {
    enabled: AtomicBool,
}

impl InMemoryAgentToggle {
    /// Creates a toggle with the given initial value.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }
}

impl Default for InMemoryAgentToggle {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AgentToggle for InMemoryAgentToggle {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "agent toggle changed");
    }
}
