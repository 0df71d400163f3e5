use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One organic result from a search provider, trimmed to what discovery
/// actually needs — grounded on the teacher's `WebSearchResultItem` shape.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

/// Object-safe so the discovery job runner can take `&dyn SearchClient` and
/// tests can swap in a fake without a generic type parameter threading
/// through every call site.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>>;
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganicResult>,
}

#[derive(Deserialize)]
struct SerperOrganicResult {
    link: String,
    title: String,
}

/// `google.serper.dev/search` client (§6, `SERPER_API_KEY`). Timeout and
/// header-auth conventions follow `OpenAiCompatClient`'s `reqwest::Client`
/// usage in `pipeline-ai`.
pub struct SerperClient {
    api_key: String,
    http: reqwest::Client,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("reqwest client builds"),
        }
    }
}

#[async_trait]
impl SearchClient for SerperClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
        let response = self
            .http
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest { q: query })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("serper search failed ({status}): {body}");
        }

        let parsed: SerperResponse = response.json().await?;
        Ok(parsed
            .organic
            .into_iter()
            .map(|r| SearchResult { url: r.link, title: r.title })
            .collect())
    }
}
