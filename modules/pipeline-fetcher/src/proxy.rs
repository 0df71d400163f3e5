use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use crate::{FetchError, FetchResponse, Fetcher};

const DEFAULT_PROXY_BASE: &str = "https://app.scrapingbee.com/api/v1/";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; EventPipelineBot/1.0; +https://example.invalid/bot)";

/// Routes a fetch through an upstream scraping-proxy API using a query-param
/// key, instead of wrapping `StaticFetcher` in a try-then-fallback chain —
/// the worker decides *when* to retry through a proxy (§4.7), this type only
/// decides *how*.
pub struct ProxyFetcher {
    client: Client,
    proxy_base: String,
    api_key: String,
}

impl ProxyFetcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base(DEFAULT_PROXY_BASE, api_key)
    }

    pub fn with_base(proxy_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("proxy fetcher http client");
        Self { client, proxy_base: proxy_base.into(), api_key: api_key.into() }
    }

    /// Any of `SCRAPER_PROXY_API_KEY` / `PROXY_PROVIDER_API_KEY` /
    /// `SCRAPINGBEE_API_KEY` being set enables this path (§6).
    pub fn enabled_from_env() -> Option<String> {
        std::env::var("SCRAPER_PROXY_API_KEY")
            .or_else(|_| std::env::var("PROXY_PROVIDER_API_KEY"))
            .or_else(|_| std::env::var("SCRAPINGBEE_API_KEY"))
            .ok()
    }
}

#[async_trait]
impl Fetcher for ProxyFetcher {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let mut request = self
            .client
            .get(&self.proxy_base)
            .query(&[("api_key", self.api_key.as_str()), ("url", url)]);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        let status_code = response.status().as_u16();
        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        Ok(FetchResponse {
            html,
            status_code,
            final_url: url.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            fetcher_used: "proxy",
        })
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
