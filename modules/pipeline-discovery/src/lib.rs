mod canonical;
mod heuristic;
mod noise;
mod query;
pub mod search;

pub use canonical::canonicalize_url;
pub use heuristic::looks_like_agenda;
pub use noise::is_noise_domain;
pub use query::generate_queries;
pub use search::{SearchClient, SearchResult};

use pipeline_ai::{DiscoveryValidation, StructuredOutputClient};
use pipeline_common::domain::DiscoveryJob;
use pipeline_common::{PipelineError, Result};
use pipeline_db::Store;
use pipeline_fetcher::Fetcher;
use tracing::{info, warn};

/// Result of running one discovery job to completion (§4.10, `/discovery-worker`).
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub job_processed: bool,
    pub sources_found: i32,
    pub sources_added: i32,
    pub pending_jobs_remaining: i64,
}

const VALIDATION_CONFIDENCE_THRESHOLD: u8 = 90;

const VALIDATION_SYSTEM_PROMPT: &str = "\
You validate whether a web page is a genuine public events listing (an \"agenda\") \
for a Dutch municipality. Only pages that list multiple dated, named events \
qualify. Pages that are a single event's detail page, a venue's generic \
homepage, a news article, or a social media profile do not qualify. \
Respond with is_valid, a confidence 0-100, and a short suggested_name for the \
source (the site or organization name, not the query).";

/// Claims and runs exactly one pending discovery job (§5: "the discovery
/// worker processes one job per invocation and self-chains"). Returns
/// `job_processed=false` when the queue was empty.
pub async fn run_one_discovery_job<C: StructuredOutputClient>(
    store: &Store,
    fetcher: &dyn Fetcher,
    search_client: &dyn SearchClient,
    ai_client: &C,
) -> Result<DiscoveryOutcome> {
    let mut jobs = store.claim_discovery_jobs(1).await?;
    let Some(job) = jobs.pop() else {
        return Ok(DiscoveryOutcome::default());
    };

    let outcome = process_discovery_job(store, fetcher, search_client, ai_client, &job).await;

    match outcome {
        Ok((found, added)) => {
            store.complete_discovery_job(job.id, found, added).await?;
            let pending_jobs_remaining = store.pipeline_health().await?.pending_jobs;
            Ok(DiscoveryOutcome {
                job_processed: true,
                sources_found: found,
                sources_added: added,
                pending_jobs_remaining,
            })
        }
        Err(e) => {
            warn!(job_id = %job.id, municipality = job.municipality, error = %e, "discovery job failed");
            store.fail_discovery_job(job.id).await?;
            let pending_jobs_remaining = store.pipeline_health().await?.pending_jobs;
            Ok(DiscoveryOutcome {
                job_processed: true,
                sources_found: 0,
                sources_added: 0,
                pending_jobs_remaining,
            })
        }
    }
}

async fn process_discovery_job<C: StructuredOutputClient>(
    store: &Store,
    fetcher: &dyn Fetcher,
    search_client: &dyn SearchClient,
    ai_client: &C,
    job: &DiscoveryJob,
) -> Result<(i32, i32)> {
    let queries = generate_queries(&job.municipality);
    let mut candidate_urls = Vec::new();

    for query in &queries {
        match search_client.search(query).await {
            Ok(results) => {
                for r in results {
                    if !is_noise_domain(&r.url) {
                        if let Some(canonical) = canonicalize_url(&r.url) {
                            candidate_urls.push((canonical, r.title));
                        }
                    }
                }
            }
            Err(e) => warn!(query, error = %e, "discovery search failed"),
        }
    }

    candidate_urls.sort_by(|a, b| a.0.cmp(&b.0));
    candidate_urls.dedup_by(|a, b| a.0 == b.0);

    let sources_found = candidate_urls.len() as i32;
    let mut sources_added = 0i32;

    for (url, fallback_name) in &candidate_urls {
        match validate_candidate(fetcher, ai_client, url, fallback_name).await {
            Ok(Some(validation)) => {
                let enabled = validation.confidence > VALIDATION_CONFIDENCE_THRESHOLD;
                match store.upsert_source(&validation.suggested_name, url, enabled).await {
                    Ok(_) => {
                        sources_added += 1;
                        info!(url, enabled, confidence = validation.confidence, "discovered source upserted");
                    }
                    Err(e) => warn!(url, error = %e, "failed to upsert discovered source"),
                }
            }
            Ok(None) => {}
            Err(e) => warn!(url, error = %e, "discovery candidate validation failed"),
        }
    }

    info!(
        municipality = job.municipality,
        candidates = candidate_urls.len(),
        sources_added,
        "discovery job complete"
    );

    Ok((sources_found, sources_added))
}

/// Fetches and validates one candidate URL. Returns `Ok(None)` when the
/// heuristic pre-check rejects the page (saves an LLM call); `Ok(Some(..))`
/// with the LLM's verdict otherwise.
async fn validate_candidate<C: StructuredOutputClient>(
    fetcher: &dyn Fetcher,
    ai_client: &C,
    url: &str,
    fallback_name: &str,
) -> Result<Option<DiscoveryValidation>> {
    let response = fetcher
        .fetch(url, &[])
        .await
        .map_err(|e| PipelineError::Transient(e.to_string()))?;

    if !looks_like_agenda(&response.html) {
        return Ok(None);
    }

    let user_prompt = format!(
        "Candidate URL: {url}\nFallback name: {fallback_name}\n\nPage content (truncated):\n{}",
        truncate_chars(&response.html, 8_000)
    );

    let validation = ai_client
        .extract::<DiscoveryValidation>(VALIDATION_SYSTEM_PROMPT, &user_prompt)
        .await
        .map_err(PipelineError::Anyhow)?;

    Ok(Some(validation))
}

fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let s = "a".repeat(10) + "é" + &"b".repeat(10);
        let truncated = truncate_chars(&s, 10);
        assert_eq!(truncated, "a".repeat(10));
    }

    #[test]
    fn truncate_chars_noop_under_limit() {
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
