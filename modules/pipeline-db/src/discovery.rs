use pipeline_common::domain::{DiscoveryJob, GeoPoint};
use pipeline_common::{PipelineError, Result};
use uuid::Uuid;

use crate::rows::DiscoveryJobRow;
use crate::store::Store;

const DISCOVERY_COLUMNS: &str = "id, municipality, ST_X(coordinates::geometry) AS lng, \
    ST_Y(coordinates::geometry) AS lat, batch_id, status, priority, attempts, sources_found, \
    sources_added, created_at, completed_at";

impl Store {
    pub async fn enqueue_discovery_job(
        &self,
        municipality: &str,
        coordinates: Option<GeoPoint>,
        batch_id: Uuid,
    ) -> Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO discovery_jobs (municipality, coordinates, batch_id) \
             VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography, $4) RETURNING id",
        )
        .bind(municipality)
        .bind(coordinates.map(|c| c.lng))
        .bind(coordinates.map(|c| c.lat))
        .bind(batch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(id)
    }

    pub async fn claim_discovery_jobs(&self, batch_size: i64) -> Result<Vec<DiscoveryJob>> {
        let sql = format!(
            r#"
            UPDATE discovery_jobs
            SET status = 'processing', attempts = attempts + 1
            WHERE id IN (
                SELECT id FROM discovery_jobs
                WHERE status = 'pending'
                ORDER BY priority DESC, created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {DISCOVERY_COLUMNS}
            "#
        );
        let rows = sqlx::query_as::<_, DiscoveryJobRow>(&sql)
            .bind(batch_size)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(DiscoveryJob::from).collect())
    }

    pub async fn complete_discovery_job(
        &self,
        id: Uuid,
        sources_found: i32,
        sources_added: i32,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE discovery_jobs SET status = 'completed', completed_at = now(), \
             sources_found = $2, sources_added = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(sources_found)
        .bind(sources_added)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn fail_discovery_job(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE discovery_jobs SET status = 'failed', completed_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }
}
