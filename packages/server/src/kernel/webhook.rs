//! Webhook delivery with bounded retries.
//!
//! A 2xx response is success. Network errors and retryable statuses back off
//! exponentially (base 1 s, capped at 60 s) for up to five attempts; anything
//! else fails immediately. The caller logs and drops undeliverable results —
//! delivery failures never re-run the underlying scoring.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use tracing::{info, warn};

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE_SECS: u64 = 1;
const BACKOFF_CAP_SECS: u64 = 60;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct WebhookDispatcher {
    client: Client,
}

impl WebhookDispatcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// POST `payload` to `url`, retrying transient failures.
    pub async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<()> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.post(url).json(payload).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(url, attempt, "webhook delivered");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        return Err(anyhow!("webhook rejected with status {}", status));
                    }
                    warn!(url, attempt, %status, "webhook attempt failed");
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "webhook attempt failed");
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(backoff(attempt)).await;
            }
        }

        Err(anyhow!(
            "webhook delivery to {} failed after {} attempts",
            url,
            MAX_ATTEMPTS
        ))
    }
}

/// Statuses worth another attempt: server errors, request timeout, and
/// rate limiting.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn backoff(attempt: u32) -> Duration {
    let secs = (BACKOFF_BASE_SECS << (attempt - 1)).min(BACKOFF_CAP_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::GONE));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
        assert_eq!(backoff(4), Duration::from_secs(8));
        // Far past the cap
        assert_eq!(
            (BACKOFF_BASE_SECS << 9).min(BACKOFF_CAP_SECS),
            BACKOFF_CAP_SECS
        );
    }
}
