pub mod deep_scrape;
pub mod fetchers;
pub mod heal;
pub mod waterfall;

use chrono::Utc;
use futures::future::join_all;
use pipeline_ai::{EmbeddingClient, StructuredOutputClient};
use pipeline_common::domain::{DlqStage, FetchStrategy, ScrapeJob, Source};
use pipeline_common::{
    Config, DeadLetterStore, ErrorLogEntry, ErrorLogSink, NotifyBackend, PipelineError, Result,
    RunSummary,
};
use pipeline_db::{InsertOutcome, Store};
use pipeline_dedup::{check_duplicate, DedupVerdict};
use pipeline_extract::{fingerprint, normalize_with_ai_fallback, run_waterfall};
use pipeline_fetcher::{fetch_with_backoff, RetryPolicy};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::deep_scrape::fill_missing_times;
use crate::fetchers::FetcherSet;
use crate::heal::{heal_on_zero, HealOutcome};
use crate::waterfall::build_waterfall;

const MIN_CARDS_FOR_STRICT: usize = 3;

/// Outcome of processing one claimed job. Never an `Err` — every failure
/// path is folded into `status`/`error` so a batch of jobs can be reported
/// on uniformly regardless of what went wrong with any individual one.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub source_id: Uuid,
    pub source_name: String,
    pub status: JobResult,
    pub events_scraped: i32,
    pub events_inserted: i32,
    pub events_duplicated: i32,
    pub events_failed: i32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    Completed,
    /// Blocked on first attempt; requeued with `proxy_retry` set rather than
    /// failed outright (§4.7 proxy retry state machine).
    Requeued,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerOutcome {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    pub all_jobs_succeeded: bool,
    pub results: Vec<JobOutcome>,
}

/// Claims a batch of jobs and runs them concurrently, then fires a Slack
/// summary and (if configured, and the claimed batch was full) chain-triggers
/// another worker invocation so a deep backlog drains without waiting for the
/// next scheduled tick — mirrors `pipeline-coordinator::trigger_worker`.
pub async fn run_worker_batch<C>(
    store: &Store,
    fetchers: &FetcherSet,
    ai: Option<&C>,
    social_ai: Option<&C>,
    config: &Config,
    worker_url: Option<&str>,
    notify: &dyn NotifyBackend,
) -> Result<WorkerOutcome>
where
    C: StructuredOutputClient + EmbeddingClient,
{
    let jobs = store.claim_scrape_jobs(config.batch_size).await?;
    let claimed = jobs.len();
    info!(claimed, "worker: claimed batch");

    let outcomes = join_all(
        jobs.iter()
            .map(|job| process_job(store, fetchers, ai, social_ai, config, job)),
    )
    .await;

    let completed = outcomes.iter().filter(|o| o.status == JobResult::Completed).count();
    let failed = outcomes.iter().filter(|o| o.status == JobResult::Failed).count();

    let summary = RunSummary {
        sources_processed: outcomes.len(),
        events_scraped: outcomes.iter().map(|o| o.events_scraped.max(0) as usize).sum(),
        events_inserted: outcomes.iter().map(|o| o.events_inserted.max(0) as usize).sum(),
        events_duplicated: outcomes.iter().map(|o| o.events_duplicated.max(0) as usize).sum(),
        events_failed: outcomes.iter().map(|o| o.events_failed.max(0) as usize).sum(),
        failures: outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.source_name)))
            .collect(),
    };

    if let Err(error) = notify.send_summary(&summary).await {
        warn!(%error, "worker: failed to send run summary");
    }

    if claimed as i64 >= config.batch_size {
        maybe_chain_trigger(store, worker_url).await;
    }

    Ok(WorkerOutcome {
        processed: outcomes.len(),
        completed,
        failed,
        all_jobs_succeeded: failed == 0,
        results: outcomes,
    })
}

async fn maybe_chain_trigger(store: &Store, worker_url: Option<&str>) {
    let Some(url) = worker_url else { return };
    match store.pipeline_health().await {
        Ok(health) if health.pending_jobs > 0 => {
            let url = url.to_string();
            tokio::spawn(async move {
                let result = reqwest::Client::new()
                    .post(&url)
                    .json(&serde_json::json!({}))
                    .send()
                    .await;
                if let Err(error) = result {
                    warn!(%error, "worker: failed to trigger next batch");
                }
            });
        }
        Ok(_) => {}
        Err(error) => warn!(%error, "worker: failed to read pipeline health before chain trigger"),
    }
}

/// Processes one claimed job end to end: fetch, extract, heal-on-zero,
/// normalize, dedup, insert. Never propagates an error out — any failure
/// that does bubble up from a store call is caught, logged (DB/systemic
/// errors go through `ErrorLogSink`, §7), and turned into a failed
/// `JobOutcome` with the job itself marked failed so it doesn't stay stuck
/// in `running`.
pub async fn process_job<C>(
    store: &Store,
    fetchers: &FetcherSet,
    ai: Option<&C>,
    social_ai: Option<&C>,
    config: &Config,
    job: &ScrapeJob,
) -> JobOutcome
where
    C: StructuredOutputClient + EmbeddingClient,
{
    match process_job_inner(store, fetchers, ai, social_ai, config, job).await {
        Ok(outcome) => outcome,
        Err(error) => {
            if matches!(error, PipelineError::Database(_) | PipelineError::Anyhow(_) | PipelineError::Systemic(_)) {
                let _ = store
                    .log_systemic(ErrorLogEntry {
                        occurred_at: Utc::now(),
                        component: "pipeline-worker".to_string(),
                        message: error.to_string(),
                        context: Some(serde_json::json!({
                            "job_id": job.id,
                            "source_id": job.source_id,
                        })),
                    })
                    .await;
            }
            let _ = store.fail_job(job.id, &error.to_string()).await;
            JobOutcome {
                job_id: job.id,
                source_id: job.source_id,
                source_name: String::new(),
                status: JobResult::Failed,
                events_scraped: 0,
                events_inserted: 0,
                events_duplicated: 0,
                events_failed: 0,
                error: Some(error.to_string()),
            }
        }
    }
}

async fn process_job_inner<C>(
    store: &Store,
    fetchers: &FetcherSet,
    ai: Option<&C>,
    social_ai: Option<&C>,
    config: &Config,
    job: &ScrapeJob,
) -> Result<JobOutcome>
where
    C: StructuredOutputClient + EmbeddingClient,
{
    let Some(source) = store.get_source(job.source_id).await? else {
        store.fail_job(job.id, "source not found").await?;
        return Ok(failed_outcome(job, String::new(), "source not found".to_string()));
    };

    let effective_strategy = if job.proxy_retry { FetchStrategy::Proxy } else { source.fetch_strategy };
    let fetcher = fetchers.select(effective_strategy);

    let response = match fetch_with_backoff(fetcher, &source.url, &[], RetryPolicy::default()).await {
        Ok(response) => response,
        Err(error) => {
            return terminal_fetch_failure(store, job, &source, error.to_string()).await;
        }
    };

    if response.is_blocked() {
        if !job.proxy_retry && fetchers.has_proxy() {
            info!(source_id = %source.id, "worker: listing blocked, requeueing for proxy retry");
            store.reset_job_for_proxy_retry(job.id).await?;
            return Ok(JobOutcome {
                job_id: job.id,
                source_id: source.id,
                source_name: source.name,
                status: JobResult::Requeued,
                events_scraped: 0,
                events_inserted: 0,
                events_duplicated: 0,
                events_failed: 0,
                error: None,
            });
        }
        let message = format!("fetch blocked (status {})", response.status_code);
        return terminal_fetch_failure(store, job, &source, message).await;
    }

    let fp = fingerprint(&response.html);
    let strategies = build_waterfall(&fp, &source.extraction_config);
    let batch = run_waterfall(&strategies, &response.html, &source.url, source.tier, MIN_CARDS_FOR_STRICT);

    let mut cards = match batch.filter(|b| !b.cards.is_empty()) {
        Some(batch) => batch.cards,
        None => match heal_on_zero(store, fetchers, ai, &source, &response.html).await? {
            HealOutcome::Recovered(batch) => batch.cards,
            HealOutcome::Failed => {
                return terminal_drift_failure(store, job, &source, response.html.len()).await;
            }
        },
    };

    if source.tier.deep_scrape() {
        fill_missing_times(fetcher, &mut cards).await;
    }

    let mut events_scraped = 0i32;
    let mut events_inserted = 0i32;
    let mut events_duplicated = 0i32;
    let mut events_failed = 0i32;

    for card in &cards {
        events_scraped += 1;

        let normalize_client = pick_ai_for_normalize(ai, social_ai);
        let normalized =
            normalize_with_ai_fallback(card, &source, config.target_event_year, normalize_client).await;

        let Some(normalized) = normalized else {
            events_failed += 1;
            continue;
        };

        let event = normalized.to_event(source.id);

        let dedup_outcome = match check_duplicate(store, &event, ai).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(source_id = %source.id, %error, "worker: dedup lookup failed for event");
                events_failed += 1;
                continue;
            }
        };

        match dedup_outcome.verdict {
            DedupVerdict::Duplicate(_) => events_duplicated += 1,
            DedupVerdict::Admit => {
                match store.insert_event(&event, dedup_outcome.embedding.as_deref()).await {
                    Ok(InsertOutcome::Inserted(_)) => events_inserted += 1,
                    Ok(InsertOutcome::DuplicateContentHash | InsertOutcome::DuplicateFingerprint) => {
                        events_duplicated += 1;
                    }
                    Err(error) => {
                        warn!(source_id = %source.id, %error, "worker: event insert failed");
                        events_failed += 1;
                    }
                }
            }
        }
    }

    store.complete_job(job.id, events_scraped, events_inserted).await?;
    store
        .update_scraper_source_stats(source.id, true, events_inserted as i64, None)
        .await?;

    Ok(JobOutcome {
        job_id: job.id,
        source_id: source.id,
        source_name: source.name,
        status: JobResult::Completed,
        events_scraped,
        events_inserted,
        events_duplicated,
        events_failed,
        error: None,
    })
}

/// Picks whichever AI client is actually configured for card normalization.
/// `social_ai` (the "Social Five" OpenAI-backed client) is preferred when
/// present since it's the one the waterfall's `AiStrategy` already talked
/// to for this source; `ai` (Gemini) otherwise provides the fallback path.
fn pick_ai_for_normalize<'a, C>(ai: Option<&'a C>, social_ai: Option<&'a C>) -> Option<&'a C> {
    social_ai.or(ai)
}

async fn terminal_fetch_failure(
    store: &Store,
    job: &ScrapeJob,
    source: &Source,
    message: String,
) -> Result<JobOutcome> {
    warn!(source_id = %source.id, %message, "worker: terminal fetch failure");
    store
        .add(job.id, source.id, DlqStage::Fetch, "fetch_error", &message, serde_json::json!({}))
        .await?;
    store.fail_job(job.id, &message).await?;
    store
        .update_scraper_source_stats(source.id, false, 0, Some(&message))
        .await?;
    Ok(failed_outcome(job, source.name.clone(), message))
}

async fn terminal_drift_failure(
    store: &Store,
    job: &ScrapeJob,
    source: &Source,
    html_bytes: usize,
) -> Result<JobOutcome> {
    let message = format!("source drift: zero cards extracted from {html_bytes} bytes of HTML");
    warn!(source_id = %source.id, %message, "worker: heal-on-zero exhausted");
    store
        .add(job.id, source.id, DlqStage::Parse, "source_drift", &message, serde_json::json!({}))
        .await?;
    store.fail_job(job.id, &message).await?;
    store
        .update_scraper_source_stats(source.id, false, 0, Some(&message))
        .await?;
    Ok(failed_outcome(job, source.name.clone(), message))
}

fn failed_outcome(job: &ScrapeJob, source_name: String, message: String) -> JobOutcome {
    JobOutcome {
        job_id: job.id,
        source_id: job.source_id,
        source_name,
        status: JobResult::Failed,
        events_scraped: 0,
        events_inserted: 0,
        events_duplicated: 0,
        events_failed: 0,
        error: Some(message),
    }
}

