mod headless;
mod proxy;
mod retry;
mod static_fetcher;

pub use headless::HeadlessFetcher;
pub use proxy::ProxyFetcher;
pub use retry::{fetch_with_backoff, RetryPolicy};
pub use static_fetcher::StaticFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a single fetch attempt. `status_code` is always populated on
/// success — a 403/404/500 page is still a successful fetch at this layer;
/// only a transport failure is an `Err`.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub html: String,
    pub status_code: u16,
    pub final_url: String,
    pub duration_ms: u64,
    pub fetcher_used: &'static str,
}

impl FetchResponse {
    pub fn is_blocked(&self) -> bool {
        matches!(self.status_code, 403 | 429)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {source}")]
    Network { url: String, #[source] source: reqwest::Error },
    #[error("headless renderer error: {0}")]
    Headless(String),
}

/// Object-safe fetch trait, one implementation per `FetchStrategy` (§4.1).
/// Never returns `Err` for an HTTP-level failure (4xx/5xx) — only for
/// transport errors that mean no response was obtained at all.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchResponse, FetchError>;
    fn name(&self) -> &'static str;
}
