use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{KnowlexError, Result};

/// Run `op` with exponential backoff, making at most `max_retries`
/// attempts in total.
///
/// The delay starts at one second and doubles between attempts. Only
/// transient failures (see [`KnowlexError::is_retryable`]) are retried;
/// anything else returns immediately. Cancellation during a backoff
/// sleep aborts with [`KnowlexError::Cancelled`].
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: usize,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay = Duration::from_secs(1);

    loop {
        if cancel.is_cancelled() {
            return Err(KnowlexError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_retries && e.is_retryable() => {
                log::warn!("retry {}/{} after error: {}", attempt + 1, max_retries, e);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(KnowlexError::Cancelled),
                }
                delay *= 2;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                return Err(KnowlexError::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
}
