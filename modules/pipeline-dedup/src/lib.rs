mod ladder;

pub use ladder::{dedup_verdict, semantic_match, DedupVerdict, DuplicateKind};

use pipeline_ai::EmbeddingClient;
use pipeline_common::domain::Event;
use pipeline_common::Result;
use pipeline_db::Store;
use tracing::debug;

/// Cosine-similarity cutoff for the ANN query (§4.5 step 3), per the
/// `match_events(query_embedding, match_threshold, match_count)` RPC
/// convention — 0.95 requires candidates be at least 95% similar.
/// `match_events` converts this to a distance cutoff internally.
const SEMANTIC_THRESHOLD: f64 = 0.95;

/// Result of running the full ladder against one normalized event: the
/// verdict, plus the embedding computed along the way (only present when a
/// semantic lookup actually ran) so the caller can store it on insert
/// without re-embedding.
pub struct DedupOutcome {
    pub verdict: DedupVerdict,
    pub embedding: Option<Vec<f32>>,
}

/// Runs the three-rung ladder (§4.5) against an already-normalized,
/// already-hashed `Event`. `embedding_client` is `None` when no embedding
/// API is configured, in which case rung 3 is skipped entirely and any
/// non-duplicate admits with no embedding — matching the spec's "only if an
/// embedding API is configured."
pub async fn check_duplicate<E: EmbeddingClient>(
    store: &Store,
    event: &Event,
    embedding_client: Option<&E>,
) -> Result<DedupOutcome> {
    let content_hash_hit = store.find_by_content_hash(&event.content_hash).await?.is_some();
    if content_hash_hit {
        return Ok(DedupOutcome { verdict: dedup_verdict(true, false, false), embedding: None });
    }

    let fingerprint_hit =
        store.find_by_fingerprint(event.source_id, &event.event_fingerprint).await?.is_some();
    if fingerprint_hit {
        return Ok(DedupOutcome { verdict: dedup_verdict(false, true, false), embedding: None });
    }

    let Some(client) = embedding_client else {
        return Ok(DedupOutcome { verdict: DedupVerdict::Admit, embedding: None });
    };

    let canonical_text = format!("{} {} {}", event.title, event.description, event.venue_name);
    let embedding = client.embed(&canonical_text).await.map_err(pipeline_common::PipelineError::Anyhow)?;

    let candidates = store.match_events(&embedding, SEMANTIC_THRESHOLD, 1).await?;
    let semantic_hit = candidates
        .first()
        .map(|(candidate, _distance)| semantic_match(candidate.event_date, event.event_date))
        .unwrap_or(false);

    if semantic_hit {
        debug!(event_title = event.title, "semantic duplicate dropped");
    }

    Ok(DedupOutcome { verdict: dedup_verdict(false, false, semantic_hit), embedding: Some(embedding) })
}
