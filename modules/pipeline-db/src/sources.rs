use pipeline_common::domain::{FetchStrategy, Source};
use pipeline_common::{PipelineError, Result};
use uuid::Uuid;

use crate::rows::SourceRow;
use crate::store::Store;

const SOURCE_COLUMNS: &str = "id, name, url, tier, enabled, auto_disabled, fetch_strategy, \
    extraction_config, ST_X(default_coordinates::geometry) AS default_lng, \
    ST_Y(default_coordinates::geometry) AS default_lat, location_name, language, \
    volatility_score, consecutive_errors, consecutive_failures, last_scraped_at, \
    next_scrape_at, last_error, total_events_scraped, quarantined, config_version";

impl Store {
    /// Sources eligible for scheduling right now (§4.6): enabled, not
    /// auto-disabled, and not in circuit-breaker cooldown. The 24h cooldown
    /// guard lives here so it's enforced at the query, not trusted to every
    /// caller — `pipeline-coordinator`'s pure scheduling math only decides
    /// cadence among rows this query already returned.
    pub async fn eligible_sources(&self) -> Result<Vec<Source>> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM scraper_sources \
             WHERE enabled AND NOT auto_disabled \
               AND (next_scrape_at IS NULL OR next_scrape_at <= now()) \
               AND (consecutive_errors < 3 OR last_scraped_at <= now() - interval '24 hours')"
        );
        let rows = sqlx::query_as::<_, SourceRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    pub async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM scraper_sources WHERE id = $1");
        let row = sqlx::query_as::<_, SourceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(row.map(Source::from))
    }

    pub async fn quarantined_or_failing_sources(&self, failure_threshold: i32) -> Result<Vec<Source>> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM scraper_sources \
             WHERE quarantined OR consecutive_failures >= $1"
        );
        let rows = sqlx::query_as::<_, SourceRow>(&sql)
            .bind(failure_threshold)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Updates rolling stats after a job finishes. `success=true` resets
    /// `consecutive_errors`; `success=false` increments it.
    pub async fn update_scraper_source_stats(
        &self,
        source_id: Uuid,
        success: bool,
        events_scraped: i64,
        error: Option<&str>,
    ) -> Result<()> {
        if success {
            sqlx::query(
                "UPDATE scraper_sources SET last_scraped_at = now(), consecutive_errors = 0, \
                 total_events_scraped = total_events_scraped + $2, last_error = NULL WHERE id = $1",
            )
            .bind(source_id)
            .bind(events_scraped)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                "UPDATE scraper_sources SET last_scraped_at = now(), \
                 consecutive_errors = consecutive_errors + 1, last_error = $2 WHERE id = $1",
            )
            .bind(source_id)
            .bind(error)
            .execute(&self.pool)
            .await
        }
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    /// Flips the fetch strategy one rung up the ladder (static -> headless ->
    /// proxy) when a source keeps yielding zero cards on otherwise-healthy
    /// HTML (§4.7 "heal on zero", step a). Returns `Some(new_strategy)` if a
    /// switch happened, `None` if already at `proxy` (caller then tries AI
    /// selector healing, step b).
    pub async fn check_and_heal_fetcher(&self, source_id: Uuid) -> Result<Option<FetchStrategy>> {
        let current: String =
            sqlx::query_scalar("SELECT fetch_strategy FROM scraper_sources WHERE id = $1")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PipelineError::Database(e.to_string()))?;

        let next = match current.as_str() {
            "static" => Some(("headless", FetchStrategy::Headless)),
            "headless" => Some(("proxy", FetchStrategy::Proxy)),
            _ => None,
        };

        if let Some((next_str, next_strategy)) = next {
            sqlx::query(
                "UPDATE scraper_sources SET fetch_strategy = $2, config_version = config_version + 1 WHERE id = $1",
            )
            .bind(source_id)
            .bind(next_str)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
            Ok(Some(next_strategy))
        } else {
            Ok(None)
        }
    }

    pub async fn persist_extraction_config(
        &self,
        source_id: Uuid,
        new_config: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE scraper_sources SET extraction_config = $2, config_version = config_version + 1 WHERE id = $1",
        )
        .bind(source_id)
        .bind(new_config)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    /// Bumps `consecutive_failures` (distinct from `consecutive_errors`,
    /// which tracks fetch/transient failures) when a source yields zero
    /// cards and the heal path doesn't fix it (§4.7/§7 SourceDrift).
    pub async fn increment_consecutive_failures(&self, source_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE scraper_sources SET consecutive_failures = consecutive_failures + 1 WHERE id = $1")
            .bind(source_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn reset_consecutive_failures(&self, source_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE scraper_sources SET consecutive_failures = 0 WHERE id = $1")
            .bind(source_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn quarantine_source(&self, source_id: Uuid, quarantined: bool) -> Result<()> {
        sqlx::query("UPDATE scraper_sources SET quarantined = $2, enabled = NOT $2 WHERE id = $1")
            .bind(source_id)
            .bind(quarantined)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn upsert_source(&self, name: &str, url: &str, enabled: bool) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO scraper_sources (name, url, tier, enabled, default_coordinates) \
             VALUES ($1, $2, 'general', $3, NULL) \
             ON CONFLICT DO NOTHING \
             RETURNING id",
        )
        .bind(name)
        .bind(url)
        .bind(enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(id)
    }

    /// Aggregate health snapshot (`get_pipeline_health` RPC, §6).
    pub async fn pipeline_health(&self) -> Result<PipelineHealth> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                (SELECT count(*) FROM scraper_sources WHERE enabled AND NOT auto_disabled), \
                (SELECT count(*) FROM scraper_sources WHERE quarantined), \
                (SELECT count(*) FROM scrape_jobs WHERE status = 'pending'), \
                (SELECT count(*) FROM dead_letter_queue WHERE status IN ('pending', 'retrying'))",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;

        Ok(PipelineHealth {
            active_sources: row.0,
            quarantined_sources: row.1,
            pending_jobs: row.2,
            dlq_outstanding: row.3,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineHealth {
    pub active_sources: i64,
    pub quarantined_sources: i64,
    pub pending_jobs: i64,
    pub dlq_outstanding: i64,
}
