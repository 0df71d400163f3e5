use async_trait::async_trait;
use pipeline_common::errorlog::{ErrorLogEntry, ErrorLogSink};
use pipeline_common::{PipelineError, Result};

use crate::store::Store;

/// Only written for `PipelineError::Systemic` (§7) — transient and
/// source-scoped failures go to `dead_letter_queue` instead, where they can
/// be retried against a specific job.
#[async_trait]
impl ErrorLogSink for Store {
    async fn log_systemic(&self, entry: ErrorLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO error_logs (occurred_at, component, message, context) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.occurred_at)
        .bind(&entry.component)
        .bind(&entry.message)
        .bind(&entry.context)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }
}
