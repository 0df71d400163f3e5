mod scheduler;

pub use scheduler::compute_next_run_minutes;

use pipeline_common::{NotifyBackend, Result, RunSummary};
use pipeline_db::Store;
use tracing::{info, warn};
use uuid::Uuid;

/// One scheduled source, returned to the `/coordinator` HTTP handler (§6).
#[derive(Debug, Clone)]
pub struct ScheduledSource {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct CoordinatorOutcome {
    pub jobs_created: usize,
    pub sources: Vec<ScheduledSource>,
}

/// Runs one coordinator pass (§4.6): selects eligible sources (optionally
/// restricted to `source_ids`), computes a volatility-scaled next run for
/// each, atomically enqueues jobs, and posts a Slack summary. `worker_url`,
/// when given, gets a fire-and-forget POST to trigger an immediate drain —
/// its failure is logged, never propagated, since the coordinator's own run
/// already succeeded by the time it fires.
pub async fn run_coordinator(
    store: &Store,
    source_ids: Option<&[Uuid]>,
    notify: &dyn NotifyBackend,
    worker_url: Option<&str>,
) -> Result<CoordinatorOutcome> {
    let mut eligible = store.eligible_sources().await?;
    if let Some(ids) = source_ids {
        eligible.retain(|s| ids.contains(&s.id));
    }

    if eligible.is_empty() {
        return Ok(CoordinatorOutcome::default());
    }

    let ids: Vec<Uuid> = eligible.iter().map(|s| s.id).collect();
    let minutes: Vec<i64> = eligible.iter().map(|s| compute_next_run_minutes(s.volatility_score)).collect();

    let jobs_created = store.enqueue_scrape_jobs(&ids, &minutes).await?;

    let sources: Vec<ScheduledSource> =
        eligible.iter().map(|s| ScheduledSource { id: s.id, name: s.name.clone() }).collect();

    let summary = RunSummary { sources_processed: sources.len(), ..Default::default() };
    if let Err(e) = notify.send_summary(&summary).await {
        warn!(error = %e, "failed to send coordinator summary");
    }

    if let Some(url) = worker_url {
        trigger_worker(url.to_string());
    }

    info!(jobs_created, sources = sources.len(), "coordinator pass complete");
    Ok(CoordinatorOutcome { jobs_created, sources })
}

fn trigger_worker(url: String) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        if let Err(e) = client.post(&url).json(&serde_json::json!({})).send().await {
            warn!(error = %e, url, "fire-and-forget worker trigger failed");
        }
    });
}
