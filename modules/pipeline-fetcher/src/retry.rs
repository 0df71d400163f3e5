use std::time::Duration;

use pipeline_common::ratelimit::{backoff_with_jitter, jittered_delay};
use tracing::warn;

use crate::{FetchError, FetchResponse, Fetcher};

/// Per-source rate limiting plus 429 backoff (§4.1), generalized from the
/// teacher's concrete `ChromeFetcher` retry loop into parameters so both the
/// static and headless fetchers share one policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub rate_limit_ms: u64,
    pub rate_jitter_ms: u64,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_ms: 300,
            rate_jitter_ms: 20,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(30),
        }
    }
}

/// Fetches `url` through `fetcher`, sleeping a jittered rate-limit delay
/// first, then retrying with exponential backoff while the response is
/// blocked (403/429). Stops retrying and returns the last response once
/// `max_retries` is exhausted — the caller decides what a still-blocked
/// response means (proxy retry, DLQ, etc).
pub async fn fetch_with_backoff(
    fetcher: &dyn Fetcher,
    url: &str,
    headers: &[(String, String)],
    policy: RetryPolicy,
) -> Result<FetchResponse, FetchError> {
    tokio::time::sleep(jittered_delay(policy.rate_limit_ms, policy.rate_jitter_ms)).await;

    let mut attempt = 0u32;
    loop {
        let response = fetcher.fetch(url, headers).await?;
        if !response.is_blocked() || attempt >= policy.max_retries {
            return Ok(response);
        }

        let delay = backoff_with_jitter(policy.backoff_base, attempt, policy.backoff_cap, 0.2);
        warn!(
            url,
            status = response.status_code,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "fetch blocked, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
