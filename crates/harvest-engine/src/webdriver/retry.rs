//! Retry with exponential backoff for WebDriver commands.
//!
//! Only transport failures are retried. Anything the remote end answered
//! (an error code, a malformed body, a lost session) is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::DriverError;

fn is_retriable(err: &DriverError) -> bool {
    matches!(err, DriverError::Http(_))
}

/// Runs `operation`, retrying transport errors up to `max_retries` extra
/// times. The wait before retry `n` (1-based) is
/// `backoff_base_secs * 2^(n-1)` seconds.
///
/// | Attempt | Sleep before it |
/// |---------|-----------------|
/// | 0 (initial) | none |
/// | 1 | 1 × 2^0 = 1 s |
/// | 2 | 1 × 2^1 = 2 s |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    command: &str,
    mut operation: F,
) -> Result<T, DriverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DriverError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            command,
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient webdriver error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
