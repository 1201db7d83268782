//! Global switch for agent work.

/// Externally persisted flag deciding whether agents may run tasks.
pub trait AgentToggle: Send + Sync {
    /// Returns whether agent work is enabled.
    fn is_enabled(&self) -> bool;

    /// Enables or disables agent work.
    fn set_enabled(&self, enabled: bool);
}
