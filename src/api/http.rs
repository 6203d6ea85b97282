use anyhow::{Context, Result};
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry schedule: 3 retries with exponential backoff from 1s, plus jitter.
const RETRY_BASE_DELAY_SECS: u64 = 1;
const MAX_RETRIES: usize = 3;
const RETRY_JITTER_DIVISOR: u128 = 4; // + up to 25% jitter

/// Upper bound for any single backoff delay (also used by the realtime reconnect loop)
const MAX_BACKOFF_SECS: u64 = 30;

fn is_retriable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retriable_send_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Exponential backoff for the given zero-based attempt, capped at `MAX_BACKOFF_SECS`.
pub(crate) fn backoff_delay(attempt: usize) -> Duration {
    let multiplier = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
    let secs = RETRY_BASE_DELAY_SECS
        .saturating_mul(multiplier)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

pub(crate) fn add_jitter(delay: Duration) -> Duration {
    let max_jitter_ms = delay.as_millis() / RETRY_JITTER_DIVISOR;
    if max_jitter_ms == 0 {
        return delay;
    }

    let max_jitter_ms = std::cmp::min(max_jitter_ms, u128::from(u64::MAX)) as u64;
    let jitter_ms = rand::thread_rng().gen_range(0..=max_jitter_ms);
    delay + Duration::from_millis(jitter_ms)
}

/// Send a request, retrying transient failures.
///
/// Non-retriable error statuses are returned as `Ok(response)` so the caller
/// can turn the body into an `ApiError`.
pub(super) async fn send_with_retry(
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let max_attempts = MAX_RETRIES + 1;
    let mut attempt = 0;

    loop {
        let can_retry = attempt < MAX_RETRIES;

        match make_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || !(can_retry && is_retriable_status(status)) {
                    return Ok(response);
                }

                let delay = add_jitter(backoff_delay(attempt));
                debug!(
                    "HTTP {} from {}; retrying in {:?} (attempt {}/{})",
                    status,
                    response.url(),
                    delay,
                    attempt + 1,
                    max_attempts
                );
                let _ = response.bytes().await;
                sleep(delay).await;
            }
            Err(err) if can_retry && is_retriable_send_error(&err) => {
                let delay = add_jitter(backoff_delay(attempt));
                debug!(
                    "HTTP request error: {}; retrying in {:?} (attempt {}/{})",
                    err,
                    delay,
                    attempt + 1,
                    max_attempts
                );
                sleep(delay).await;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)).with_context(|| {
                    format!("HTTP request failed after {} attempt(s)", attempt + 1)
                });
            }
        }

        attempt += 1;
    }
}
