use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::schema::StructuredOutput;
use crate::traits::{EmbeddingClient, StructuredOutputClient};

/// Chat-completions client targeting an OpenAI-compatible `/chat/completions`
/// + `/embeddings` surface. Gemini's OpenAI-compatibility endpoint and the
/// real OpenAI API both speak this wire shape, so one client covers both
/// provider env vars (§6: `OPENAI_API_KEY`, `GEMINI_API_KEY` /
/// `GOOGLE_AI_API_KEY`) by swapping `base_url` and `model`.
pub struct OpenAiCompatClient {
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: String,
    http: Client,
}

impl OpenAiCompatClient {
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            http: Client::new(),
        }
    }

    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-004".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            http: Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.api_key).parse().expect("valid bearer header"),
        );
        headers
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct StructuredRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: serde_json::Value,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl StructuredOutputClient for OpenAiCompatClient {
    async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<T>
    where
        T: StructuredOutput + JsonSchema + DeserializeOwned + Send + 'static,
    {
        let request = StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage { role: "system", content: system_prompt.to_string() },
                WireMessage { role: "user", content: user_prompt.to_string() },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "structured_response",
                    strict: true,
                    schema: T::response_schema(),
                },
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self.http.post(&url).headers(self.headers()).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("structured output request failed ({status}): {body}");
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("no content in structured output response"))?;

        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("structured response did not match schema: {e}"))
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage { role: "system", content: system_prompt.to_string() },
                WireMessage { role: "user", content: user_prompt.to_string() },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self.http.post(&url).headers(self.headers()).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completion failed ({status}): {body}");
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("no content in chat completion response"))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiCompatClient {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut batch = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        batch.pop().ok_or_else(|| anyhow::anyhow!("no embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: serde_json::Value::Array(
                texts.iter().cloned().map(serde_json::Value::String).collect(),
            ),
        };

        let url = format!("{}/embeddings", self.base_url);
        let response = self.http.post(&url).headers(self.headers()).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("embedding request failed ({status}): {body}");
        }

        let embed_response: EmbeddingResponse = response.json().await?;
        Ok(embed_response.data.into_iter().map(|d| d.embedding).collect())
    }
}
