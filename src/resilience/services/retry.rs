//! Bounded exponential retry.

use crate::resilience::domain::{DependencyError, RetryPolicy};
use std::future::Future;

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// the policy's retry budget is exhausted.
///
/// The delay before retry `n` (zero based) is
/// `min(base_delay * 2^n, max_delay)`.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: DependencyError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_transient() || attempt >= policy.max_retries => {
                return Err(error);
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
