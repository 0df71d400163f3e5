use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use pipeline_healer::HealerMode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> axum::response::Response {
    (status, Json(json!({ "success": false, "error": message.to_string() }))).into_response()
}

/// `GET /` — liveness probe; `GET /health` — the `get_pipeline_health` RPC (§6).
pub async fn root() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.store.pipeline_health().await {
        Ok(health) => Json(json!({
            "activeSources": health.active_sources,
            "quarantinedSources": health.quarantined_sources,
            "pendingJobs": health.pending_jobs,
            "dlqOutstanding": health.dlq_outstanding,
        }))
        .into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorRequest {
    pub source_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceBrief {
    id: Uuid,
    name: String,
}

/// `POST /coordinator` (§6): schedules jobs for eligible sources, optionally
/// restricted to `sourceIds`.
pub async fn coordinator(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CoordinatorRequest>,
) -> axum::response::Response {
    let source_ids = body.source_ids.as_deref();
    let worker_url = state.worker_url();

    match pipeline_coordinator::run_coordinator(&state.store, source_ids, state.notify.as_ref(), worker_url.as_deref())
        .await
    {
        Ok(outcome) => Json(json!({
            "success": true,
            "jobsCreated": outcome.jobs_created,
            "sources": outcome.sources.iter().map(|s| SourceBrief { id: s.id, name: s.name.clone() }).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    /// Accepted for wire compatibility (§6); per-source deep-scrape
    /// eligibility is already governed by `Tier::deep_scrape()` (§4.3 tier
    /// policy table), so this flag only ever narrows, never widens, what the
    /// tier already allows — see DESIGN.md Open Question resolution.
    #[allow(dead_code)]
    pub enable_deep_scraping: Option<bool>,
}

/// `POST /worker` (§6): claims and processes one batch. 200 if every claimed
/// job completed; 207 if any failed.
pub async fn worker(
    State(state): State<Arc<AppState>>,
    Json(_body): Json<WorkerRequest>,
) -> axum::response::Response {
    let worker_url = state.worker_url();

    let outcome = match (state.gemini.as_ref(), state.social.as_ref()) {
        (_, Some(social)) => {
            pipeline_worker::run_worker_batch(
                &state.store,
                &state.fetchers,
                state.gemini.as_ref(),
                Some(social),
                &state.config,
                worker_url.as_deref(),
                state.notify.as_ref(),
            )
            .await
        }
        (Some(gemini), None) => {
            pipeline_worker::run_worker_batch(
                &state.store,
                &state.fetchers,
                Some(gemini),
                None,
                &state.config,
                worker_url.as_deref(),
                state.notify.as_ref(),
            )
            .await
        }
        (None, None) => {
            pipeline_worker::run_worker_batch::<pipeline_ai::OpenAiCompatClient>(
                &state.store,
                &state.fetchers,
                None,
                None,
                &state.config,
                worker_url.as_deref(),
                state.notify.as_ref(),
            )
            .await
        }
    };

    match outcome {
        Ok(outcome) => {
            let status = if outcome.all_jobs_succeeded { StatusCode::OK } else { StatusCode::MULTI_STATUS };
            (
                status,
                Json(json!({
                    "success": true,
                    "allJobsSucceeded": outcome.all_jobs_succeeded,
                    "processed": outcome.processed,
                    "batchSize": state.config.batch_size,
                    "summary": {
                        "processed": outcome.processed,
                        "completed": outcome.completed,
                        "failed": outcome.failed,
                        "results": outcome.results,
                    },
                })),
            )
                .into_response()
        }
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    /// Accepted for wire compatibility (§6); the current discovery queue
    /// has no batch-scoped claim query, so this doesn't yet filter which
    /// pending job gets claimed — see DESIGN.md.
    #[allow(dead_code)]
    pub batch_id: Option<Uuid>,
}

/// `POST /discovery-worker` (§6): claims and runs exactly one pending
/// discovery job (§5: "the discovery worker processes one job per
/// invocation and self-chains").
pub async fn discovery_worker(
    State(state): State<Arc<AppState>>,
    Json(_body): Json<DiscoveryRequest>,
) -> axum::response::Response {
    let Some(ai_client) = state.structured_ai() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "no structured-output AI client configured");
    };
    let Some(search_client) = state.search_client() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "SERPER_API_KEY not configured");
    };
    let fetcher = state.fetchers.select(pipeline_common::domain::FetchStrategy::Static);

    match pipeline_discovery::run_one_discovery_job(&state.store, fetcher, search_client, ai_client).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "job": {
                "processed": outcome.job_processed,
                "sourcesFound": outcome.sources_found,
                "sourcesAdded": outcome.sources_added,
            },
            "pendingJobsRemaining": outcome.pending_jobs_remaining,
        }))
        .into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealerRequest {
    pub mode: Option<String>,
    pub source_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// `POST /healer` (§6): diagnose/repair/unquarantine quarantined or
/// persistently-failing sources.
pub async fn healer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HealerRequest>,
) -> axum::response::Response {
    let mode = match body.mode.as_deref().unwrap_or("diagnose").parse::<HealerMode>() {
        Ok(mode) => mode,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, error),
    };

    let Some(ai_client) = state.structured_ai() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "no structured-output AI client configured");
    };
    let fetcher = state.fetchers.select(pipeline_common::domain::FetchStrategy::Static);

    match pipeline_healer::run_healer(&state.store, fetcher, ai_client, mode, body.source_id, body.limit).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "mode": mode.to_string(),
            "results": outcome.mode_run,
        }))
        .into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

/// Background stale-job reaper (§5): moves `running` jobs older than
/// `older_than_minutes` back to `pending` so a crashed or timed-out
/// invocation doesn't strand a job forever. Not an HTTP handler — run on an
/// interval by `daemon::run_reaper_loop`; exposed here since it shares this
/// module's error-logging convention.
pub async fn reap_once(state: &AppState, older_than_minutes: i64) -> Value {
    match state.store.reap_stale_jobs(older_than_minutes).await {
        Ok(reaped) => json!({ "reaped": reaped }),
        Err(error) => {
            warn!(%error, "reaper: failed to sweep stale jobs");
            json!({ "reaped": 0, "error": error.to_string() })
        }
    }
}
