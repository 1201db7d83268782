//! Correlation context carried through a delegation batch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Correlation data attached to every task in a batch.
///
/// `correlation_id` is the `repo#number` key of the originating pull request
/// or issue; it groups active tasks so they can be paused or cancelled
/// together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationContext {
    correlation_id: String,
    delivery_id: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl DelegationContext {
    /// Creates a context for the given correlation key.
    #[must_use]
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            delivery_id: None,
            metadata: Map::new(),
        }
    }

    /// Sets the webhook delivery identifier.
    #[must_use]
    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }

    /// Adds a metadata entry forwarded to agents.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the correlation key.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Returns the webhook delivery identifier.
    #[must_use]
    pub fn delivery_id(&self) -> Option<&str> {
        self.delivery_id.as_deref()
    }

    /// Returns forwarded metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
