use chrono::Utc;
use pipeline_common::domain::ScrapeJob;
use pipeline_common::{PipelineError, Result};
use uuid::Uuid;

use crate::rows::ScrapeJobRow;
use crate::store::Store;

impl Store {
    /// Atomically claims up to `batch_size` pending jobs, transitioning them
    /// `pending -> running` and incrementing `attempts` in a single
    /// statement. `SKIP LOCKED` is what makes two concurrent worker
    /// invocations never claim the same row (§9: "atomic job claiming must
    /// be implemented at the DB layer").
    pub async fn claim_scrape_jobs(&self, batch_size: i64) -> Result<Vec<ScrapeJob>> {
        let rows = sqlx::query_as::<_, ScrapeJobRow>(
            r#"
            UPDATE scrape_jobs
            SET status = 'running', attempts = attempts + 1, started_at = now()
            WHERE id IN (
                SELECT id FROM scrape_jobs
                WHERE status = 'pending'
                ORDER BY priority DESC, created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, source_id, status, attempts, max_attempts, proxy_retry,
                      priority, created_at, started_at, completed_at, events_scraped,
                      events_inserted, error_message
            "#,
        )
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(ScrapeJob::from).collect())
    }

    /// Inserts one `pending` job per eligible source and advances its
    /// `next_scrape_at` in the same round trip.
    pub async fn enqueue_scrape_jobs(
        &self,
        source_ids: &[Uuid],
        next_run_minutes: &[i64],
    ) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;

        let mut created = 0usize;
        for (source_id, minutes) in source_ids.iter().zip(next_run_minutes.iter()) {
            sqlx::query(
                "INSERT INTO scrape_jobs (source_id, status, payload) VALUES ($1, 'pending', $2)",
            )
            .bind(source_id)
            .bind(serde_json::json!({ "sourceId": source_id, "scheduledAt": Utc::now() }))
            .execute(&mut *tx)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;

            sqlx::query("UPDATE scraper_sources SET next_scrape_at = now() + ($1 || ' minutes')::interval WHERE id = $2")
                .bind(minutes.to_string())
                .bind(source_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| PipelineError::Database(e.to_string()))?;

            created += 1;
        }

        tx.commit().await.map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(created)
    }

    /// Resets a `failed` job back to `pending` with `proxyRetry=true`. The
    /// caller (`pipeline-worker`) is responsible for only calling this once
    /// per job (§4.7: "exactly one proxy retry per job").
    pub async fn reset_job_for_proxy_retry(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE scrape_jobs SET status = 'pending', proxy_retry = true WHERE id = $1 AND proxy_retry = false",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn complete_job(
        &self,
        job_id: Uuid,
        events_scraped: i32,
        events_inserted: i32,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE scrape_jobs SET status = 'completed', completed_at = now(), \
             events_scraped = $2, events_inserted = $3 WHERE id = $1",
        )
        .bind(job_id)
        .bind(events_scraped)
        .bind(events_inserted)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE scrape_jobs SET status = 'failed', completed_at = now(), error_message = $2 WHERE id = $1",
        )
        .bind(job_id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    /// Stale-job reaper (§5): moves `running` jobs whose invocation deadline
    /// has passed back to `pending`. Filters on `started_at` (set by
    /// `claim_scrape_jobs` at claim time), not `created_at` — a job can sit
    /// `pending` in a backed-up queue far longer than the deadline without
    /// being stale, since it hasn't started running yet.
    pub async fn reap_stale_jobs(&self, older_than_minutes: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE scrape_jobs SET status = 'pending' \
             WHERE status = 'running' AND started_at < now() - ($1 || ' minutes')::interval",
        )
        .bind(older_than_minutes.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
