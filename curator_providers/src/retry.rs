use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run `operation`, retrying once after each entry of `delays` (in seconds).
///
/// An empty `delays` slice means a single attempt. Returns the first success,
/// or the error from the final attempt.
pub async fn retry_with_delays<F, Fut, T, E>(mut operation: F, delays: &[u64]) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = delays.len() + 1;
    let mut result = operation().await;

    for (i, delay_secs) in delays.iter().enumerate() {
        let Err(e) = &result else {
            break;
        };
        warn!(
            "Request failed (attempt {}/{attempts}): {e}. Retrying after {delay_secs}s...",
            i + 1
        );
        sleep(Duration::from_secs(*delay_secs)).await;
        result = operation().await;
    }

    result
}
