use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::schema::StructuredOutput;

/// Decouples callers (normalization fallback, extraction AI strategy,
/// selector healing, discovery validation) from the wire client the same
/// way the teacher's `Agent`/`PromptBuilder` pair decouples its callers —
/// swap or mock the implementation without touching call sites.
#[async_trait]
pub trait StructuredOutputClient: Send + Sync {
    async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<T>
    where
        T: StructuredOutput + JsonSchema + DeserializeOwned + Send + 'static;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
