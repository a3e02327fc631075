use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

// Backoff never grows past this
const MAX_BACKOFF: Duration = Duration::from_secs(10);

// Delay to wait after a failed attempt (0-based index): base * 2^attempt, capped
pub fn backoff_delay(attempt: u32, base_delay: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base_delay.saturating_mul(factor).min(MAX_BACKOFF)
}

// Run `op` up to max_retries + 1 times with capped exponential backoff between
// attempts. Returns the first success, or the last error once the budget is spent.
pub async fn retry<T, E, F, Fut>(max_retries: u32, base_delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    attempt = attempt + 1,
                    total = max_retries + 1,
                    "attempt failed: {err}"
                );
                if attempt >= max_retries {
                    return Err(err);
                }
                let delay = backoff_delay(attempt, base_delay);
                warn!("retrying in {}ms", delay.as_millis());
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
