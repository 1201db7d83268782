//! Recording shared connection.

use crate::runtime::ports::{ConnectionError, SharedConnection};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connection that records whether it was closed.
#[derive(Debug)]
pub struct InMemoryConnection {
    name: String,
    failure: Option<String>,
    closed: AtomicBool,
}

impl InMemoryConnection {
    /// Creates a connection that closes cleanly.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a connection whose close fails with `message`.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(name)
        }
    }

    /// Returns whether [`SharedConnection::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SharedConnection for InMemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.closed.store(true, Ordering::SeqCst);
        self.failure.as_ref().map_or(Ok(()), |message| {
            Err(ConnectionError {
                name: self.name.clone(),
                message: message.clone(),
            })
        })
    }
}
