//! In-memory dead-letter store.

use crate::runtime::{
    domain::DeadLetterStats,
    ports::{DeadLetterError, DeadLetterStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Dead-letter store keeping only the time each entry was stored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeadLetters {
    entries: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl InMemoryDeadLetters {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed job stored at `at`.
    pub fn push(&self, at: DateTime<Utc>) {
        self.lock().push(at);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DateTime<Utc>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DeadLetterStore for InMemoryDeadLetters {
    async fn stats(&self) -> Result<DeadLetterStats, DeadLetterError> {
        let entries = self.lock();
        Ok(DeadLetterStats {
            count: entries.len(),
            oldest: entries.iter().min().copied(),
        })
    }

    async fn clear(&self) -> Result<usize, DeadLetterError> {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}
