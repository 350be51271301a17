//! Retry-with-backoff helper shared by handlers that call out to
//! collaborators (spec §4.3 `llm.invoke`, §7 `NetworkError` policy).
//!
//! Exponential backoff, factor 2, ±20% jitter, capped at `max_retries`
//! attempts beyond the first.

use std::time::Duration;

use crate::error::ActionError;

/// Retry `op` while it returns a retryable [`ActionError`], up to
/// `max_retries` additional attempts after the first, sleeping
/// `initial_backoff_ms * 2^attempt` with ±20% jitter between attempts.
pub async fn retry_with_backoff<F, Fut, T>(max_retries: u32, initial_backoff_ms: u64, mut op: F) -> Result<T, ActionError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ActionError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(initial_backoff_ms, attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after backoff");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub(crate) fn backoff_delay(initial_backoff_ms: u64, attempt: u32) -> Duration {
    let base = initial_backoff_ms.saturating_mul(1u64 << attempt.min(16));
    let jitter_range = (base as f64 * 0.2) as i64;
    let jitter = if jitter_range == 0 {
        0
    } else {
        fastrand::i64(-jitter_range..=jitter_range)
    };
    let millis = (base as i64 + jitter).max(0) as u64;
    Duration::from_millis(millis)
}
