use pipeline_common::domain::RepairLog;
use pipeline_common::{PipelineError, Result};
use uuid::Uuid;

use crate::rows::RepairLogRow;
use crate::store::Store;

const REPAIR_COLUMNS: &str = "id, source_id, trigger_reason, raw_html_sample, ai_diagnosis, \
    old_config, new_config, validation_passed, applied, applied_at";

impl Store {
    /// Records an AI-selector-healing attempt (§4.8 step b) before it's
    /// validated, so a crash mid-repair still leaves an audit trail.
    pub async fn log_repair_attempt(
        &self,
        source_id: Uuid,
        trigger_reason: &str,
        raw_html_sample: &str,
        old_config: &serde_json::Value,
    ) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO sg_ai_repair_log (source_id, trigger_reason, raw_html_sample, old_config) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(source_id)
        .bind(trigger_reason)
        .bind(raw_html_sample)
        .bind(old_config)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(id)
    }

    pub async fn record_repair_diagnosis(&self, id: Uuid, diagnosis: &str, new_config: &serde_json::Value) -> Result<()> {
        sqlx::query("UPDATE sg_ai_repair_log SET ai_diagnosis = $2, new_config = $3 WHERE id = $1")
            .bind(id)
            .bind(diagnosis)
            .bind(new_config)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn record_repair_validation(&self, id: Uuid, passed: bool) -> Result<()> {
        sqlx::query("UPDATE sg_ai_repair_log SET validation_passed = $2 WHERE id = $1")
            .bind(id)
            .bind(passed)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn mark_repair_applied(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sg_ai_repair_log SET applied = true, applied_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn recent_repairs_for_source(&self, source_id: Uuid, limit: i64) -> Result<Vec<RepairLog>> {
        let sql = format!(
            "SELECT {REPAIR_COLUMNS} FROM sg_ai_repair_log WHERE source_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, RepairLogRow>(&sql)
            .bind(source_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(RepairLog::from).collect())
    }
}
