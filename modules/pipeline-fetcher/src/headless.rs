use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{FetchError, FetchResponse, Fetcher};

/// Renders JS-heavy pages through a hosted browser-rendering HTTP API
/// (Browserless-shaped `/content` endpoint) rather than driving a local
/// Chromium subprocess, so the worker/coordinator can stay stateless
/// request handlers with no browser binary dependency.
pub struct HeadlessFetcher {
    client: Client,
    endpoint: String,
    token: String,
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(rename = "gotoOptions", skip_serializing_if = "Option::is_none")]
    goto_options: Option<Value>,
}

impl HeadlessFetcher {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, token, Duration::from_secs(30))
    }

    pub fn with_timeout(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("headless fetcher http client");
        Self { client, endpoint: endpoint.into(), token: token.into() }
    }

    fn content_url(&self) -> String {
        format!("{}/content?token={}", self.endpoint.trim_end_matches('/'), self.token)
    }
}

#[async_trait]
impl Fetcher for HeadlessFetcher {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let body = ContentRequest {
            url,
            goto_options: Some(serde_json::json!({ "waitUntil": "networkidle2" })),
        };

        let mut request = self.client.post(self.content_url()).json(&body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Headless(format!(
                "rendering service returned {status_code}: {text}"
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        Ok(FetchResponse {
            html,
            status_code,
            final_url: url.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            fetcher_used: "headless",
        })
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}
