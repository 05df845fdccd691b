use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

const MAX_RETRIES: u32 = 3;

/// Run a request, retrying transient failures with exponential backoff.
/// Client errors a retry cannot fix (400, 401, 404) are returned as-is.
pub async fn retry_request<T, F, Fut>(operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retryable(&err) || attempt + 1 >= MAX_RETRIES {
                    return Err(err);
                }
                warn!(attempt = attempt + 1, error = %err, "Request failed, retrying");
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                attempt += 1;
            }
        }
    }
}

fn is_retryable(err: &anyhow::Error) -> bool {
    if let Some(status) = err
        .downcast_ref::<reqwest::Error>()
        .and_then(reqwest::Error::status)
    {
        return !matches!(status.as_u16(), 400 | 401 | 404);
    }
    true
}
