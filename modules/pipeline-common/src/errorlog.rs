use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One row written to `error_logs` — only for `PipelineError::Systemic`
/// (§7); every other variant is handled inline by its caller.
#[derive(Debug, Clone)]
pub struct ErrorLogEntry {
    pub occurred_at: DateTime<Utc>,
    pub component: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}

#[async_trait]
pub trait ErrorLogSink: Send + Sync {
    async fn log_systemic(&self, entry: ErrorLogEntry) -> Result<()>;
}
