use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use crate::{FetchError, FetchResponse, Fetcher};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; EventPipelineBot/1.0; +https://example.invalid/bot)";

/// Plain HTTP GET through `reqwest`. Never maps a 4xx/5xx response into an
/// `Err` — only a transport failure (DNS, TLS, connect timeout) is one.
pub struct StaticFetcher {
    client: Client,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(15))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(timeout)
            .build()
            .expect("static fetcher http client");
        Self { client }
    }
}

impl Default for StaticFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        Ok(FetchResponse {
            html,
            status_code,
            final_url,
            duration_ms: start.elapsed().as_millis() as u64,
            fetcher_used: "static",
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_is_stable() {
        assert!(DEFAULT_USER_AGENT.contains("EventPipelineBot"));
    }
}
