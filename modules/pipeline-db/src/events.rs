use pgvector::Vector;
use pipeline_common::domain::Event;
use pipeline_common::{PipelineError, Result};
use uuid::Uuid;

use crate::rows::EventRow;
use crate::store::Store;

const EVENT_COLUMNS: &str = "id, title, description, category, event_type, venue_name, \
    ST_X(location::geometry) AS lng, ST_Y(location::geometry) AS lat, event_date, event_time, \
    image_url, source_id, event_fingerprint, content_hash, embedding_model, status";

/// Outcome of `insert_event`, distinguishing a fresh row from a duplicate
/// rejected by the unique constraints (§4.5 rung 1/2: content hash is global,
/// fingerprint is scoped to `source_id`).
pub enum InsertOutcome {
    Inserted(Uuid),
    DuplicateContentHash,
    DuplicateFingerprint,
}

impl Store {
    pub async fn insert_event(
        &self,
        event: &Event,
        embedding: Option<&[f32]>,
    ) -> Result<InsertOutcome> {
        let vector = embedding.map(|e| Vector::from(e.to_vec()));
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO events (title, description, category, event_type, venue_name, \
             location, event_date, event_time, image_url, source_id, event_fingerprint, \
             content_hash, embedding, embedding_model, status) \
             VALUES ($1, $2, $3, $4, $5, ST_SetSRID(ST_MakePoint($6, $7), 4326)::geography, \
             $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING id",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(category_str(event.category))
        .bind(event_type_str(event.event_type))
        .bind(&event.venue_name)
        .bind(event.location.lng)
        .bind(event.location.lat)
        .bind(event.event_date)
        .bind(&event.event_time)
        .bind(&event.image_url)
        .bind(event.source_id)
        .bind(&event.event_fingerprint)
        .bind(&event.content_hash)
        .bind(vector)
        .bind(&event.embedding_model)
        .bind(status_str(event.status))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(InsertOutcome::Inserted(id)),
            Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some("events_content_hash_key") => {
                Ok(InsertOutcome::DuplicateContentHash)
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some("events_source_id_event_fingerprint_key") =>
            {
                Ok(InsertOutcome::DuplicateFingerprint)
            }
            Err(e) => Err(PipelineError::Database(e.to_string())),
        }
    }

    pub async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE content_hash = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(row.map(Event::from))
    }

    pub async fn find_by_fingerprint(&self, source_id: Uuid, fingerprint: &str) -> Result<Option<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE source_id = $1 AND event_fingerprint = $2"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(source_id)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(row.map(Event::from))
    }

    /// Nearest-neighbour candidates for the semantic dedup rung (§4.5 rung 3).
    /// `match_threshold` is a cosine-**similarity** value per the canonical
    /// Supabase/pgvector `match_<table>(query_embedding, match_threshold,
    /// match_count)` RPC convention (0.95 = require ≥95% similarity) —
    /// matching the teacher's `cluster_listings.rs`, which computes
    /// `cosine_distance_threshold = 1.0 - similarity_threshold` before
    /// filtering on the `<=>` distance operator. `match_count` caps how many
    /// candidates the caller has to run pairwise verification against.
    pub async fn match_events(
        &self,
        query_embedding: &[f32],
        match_threshold: f64,
        match_count: i64,
    ) -> Result<Vec<(Event, f64)>> {
        let vector = Vector::from(query_embedding.to_vec());
        let distance_cutoff = 1.0 - match_threshold;
        let sql = format!(
            "SELECT {EVENT_COLUMNS}, (embedding <=> $1) AS distance FROM events \
             WHERE embedding IS NOT NULL AND status = 'active' \
               AND (embedding <=> $1) <= $2 \
             ORDER BY embedding <=> $1 \
             LIMIT $3"
        );

        #[derive(sqlx::FromRow)]
        struct MatchRow {
            #[sqlx(flatten)]
            event: EventRow,
            distance: f64,
        }

        let rows = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(vector)
            .bind(distance_cutoff)
            .bind(match_count)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| (Event::from(r.event), r.distance))
            .collect())
    }

    pub async fn archive_event(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE events SET status = 'archived' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn backfill_embedding(&self, id: Uuid, embedding: &[f32], model: &str) -> Result<()> {
        let vector = Vector::from(embedding.to_vec());
        sqlx::query("UPDATE events SET embedding = $2, embedding_model = $3 WHERE id = $1")
            .bind(id)
            .bind(vector)
            .bind(model)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Database(e.to_string()))?;
        Ok(())
    }
}

fn category_str(c: pipeline_common::domain::Category) -> &'static str {
    use pipeline_common::domain::Category::*;
    match c {
        Active => "active",
        Gaming => "gaming",
        Entertainment => "entertainment",
        Social => "social",
        Family => "family",
        Outdoors => "outdoors",
        Music => "music",
        Workshops => "workshops",
        Foodie => "foodie",
        Community => "community",
    }
}

fn event_type_str(k: pipeline_common::domain::EventKind) -> &'static str {
    use pipeline_common::domain::EventKind::*;
    match k {
        Anchor => "anchor",
        Signal => "signal",
        Fork => "fork",
    }
}

fn status_str(s: pipeline_common::domain::EventStatus) -> &'static str {
    use pipeline_common::domain::EventStatus::*;
    match s {
        Active => "active",
        Cancelled => "cancelled",
        Archived => "archived",
    }
}
