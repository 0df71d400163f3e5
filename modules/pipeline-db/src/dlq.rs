use async_trait::async_trait;
use pipeline_common::domain::{DeadLetterItem, DlqStage};
use pipeline_common::dlq::{next_retry_at, DlqStats};
use pipeline_common::{DeadLetterStore, PipelineError, Result};
use uuid::Uuid;

use crate::rows::DlqRow;
use crate::store::Store;

const DLQ_COLUMNS: &str = "id, original_job_id, source_id, stage, error_type, error_message, \
    error_stack, payload, retry_count, max_retries, next_retry_at, status, resolved_at, \
    resolution_notes";

fn stage_str(s: DlqStage) -> &'static str {
    match s {
        DlqStage::Fetch => "fetch",
        DlqStage::Parse => "parse",
        DlqStage::Normalize => "normalize",
        DlqStage::Dedup => "dedup",
        DlqStage::Insert => "insert",
        DlqStage::Enrich => "enrich",
    }
}

#[async_trait]
impl DeadLetterStore for Store {
    async fn add(
        &self,
        original_job_id: Uuid,
        source_id: Uuid,
        stage: DlqStage,
        error_type: &str,
        error_message: &str,
        payload: serde_json::Value,
    ) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO dead_letter_queue (original_job_id, source_id, stage, error_type, \
             error_message, payload) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(original_job_id)
        .bind(source_id)
        .bind(stage_str(stage))
        .bind(error_type)
        .bind(error_message)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(id)
    }

    async fn items_ready_for_retry(&self, limit: i64) -> Result<Vec<DeadLetterItem>> {
        let sql = format!(
            "SELECT {DLQ_COLUMNS} FROM dead_letter_queue \
             WHERE status IN ('pending', 'retrying') AND next_retry_at <= now() \
             ORDER BY next_retry_at ASC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, DlqRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(DeadLetterItem::from).collect())
    }

    async fn mark_retrying(&self, id: Uuid) -> Result<()> {
        let row: (i32,) = sqlx::query_as("SELECT retry_count FROM dead_letter_queue WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        let next = next_retry_at(chrono::Utc::now(), row.0);

        sqlx::query(
            "UPDATE dead_letter_queue SET status = 'retrying', retry_count = retry_count + 1, \
             next_retry_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(next)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_resolved(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE dead_letter_queue SET status = 'resolved', resolved_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_discarded(&self, id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE dead_letter_queue SET status = 'discarded', resolved_at = now(), \
             resolution_notes = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    async fn reset_to_pending(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE dead_letter_queue SET status = 'pending', next_retry_at = now(), \
             resolved_at = NULL, resolution_notes = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> Result<DlqStats> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                count(*) FILTER (WHERE status = 'pending'), \
                count(*) FILTER (WHERE status = 'retrying'), \
                count(*) FILTER (WHERE status = 'resolved'), \
                count(*) FILTER (WHERE status = 'discarded') \
             FROM dead_letter_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;

        Ok(DlqStats {
            pending: row.0,
            retrying: row.1,
            resolved: row.2,
            discarded: row.3,
        })
    }

    async fn cleanup_old_items(&self, days_old: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM dead_letter_queue \
             WHERE status IN ('resolved', 'discarded') \
               AND resolved_at < now() - ($1 || ' days')::interval",
        )
        .bind(days_old.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
