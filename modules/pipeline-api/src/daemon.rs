use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::handlers;
use crate::state::AppState;

/// Default stale-`running`-job sweep interval and staleness window (§5:
/// "the job is left `running` and recovered by a stale-job reaper ... that
/// moves `running` jobs older than N minutes back to `pending`"). Neither is
/// wired to an env var — the reaper is a safety net, not a tuning surface.
const REAPER_INTERVAL_SECS: u64 = 300;
const REAPER_STALE_MINUTES: i64 = 30;

/// Daemon-mode interval loop (§6: `SCRAPE_INTERVAL_MS` tuning): runs a
/// coordinator pass, then a worker pass, every `scrape_interval_ms`.
/// Mirrors the teacher's `rest::scout::start_scout_interval` — a detached
/// background loop started from `main` only when the interval is configured,
/// sleeping between passes rather than using a cron-like scheduler.
pub fn start_interval_loop(state: Arc<AppState>) {
    let interval = Duration::from_millis(state.config.scrape_interval_ms);
    info!(interval_ms = state.config.scrape_interval_ms, "daemon: starting coordinator/worker interval loop");

    tokio::spawn(async move {
        loop {
            if let Err(error) =
                pipeline_coordinator::run_coordinator(&state.store, None, state.notify.as_ref(), None).await
            {
                error!(%error, "daemon: coordinator pass failed");
            }

            if let Err(error) = run_worker_drain(&state).await {
                error!(%error, "daemon: worker pass failed");
            }

            tokio::time::sleep(interval).await;
        }
    });
}

/// Drains the worker queue: runs batches back to back until a batch comes
/// back short of `batch_size`, matching the chain-trigger's own stopping
/// condition (`run_worker_batch` only self-chains on a full batch) so the
/// interval loop and the HTTP chain-trigger converge on the same queue depth.
async fn run_worker_drain(state: &AppState) -> pipeline_common::Result<()> {
    loop {
        let outcome = match (state.gemini.as_ref(), state.social.as_ref()) {
            (_, Some(social)) => {
                pipeline_worker::run_worker_batch(
                    &state.store,
                    &state.fetchers,
                    state.gemini.as_ref(),
                    Some(social),
                    &state.config,
                    None,
                    state.notify.as_ref(),
                )
                .await?
            }
            (Some(gemini), None) => {
                pipeline_worker::run_worker_batch(
                    &state.store,
                    &state.fetchers,
                    Some(gemini),
                    None,
                    &state.config,
                    None,
                    state.notify.as_ref(),
                )
                .await?
            }
            (None, None) => {
                pipeline_worker::run_worker_batch::<pipeline_ai::OpenAiCompatClient>(
                    &state.store,
                    &state.fetchers,
                    None,
                    None,
                    &state.config,
                    None,
                    state.notify.as_ref(),
                )
                .await?
            }
        };

        if (outcome.processed as i64) < state.config.batch_size {
            break;
        }
    }
    Ok(())
}

/// Background stale-job reaper loop (§5), started unconditionally — unlike
/// the coordinator/worker interval, recovering abandoned `running` jobs
/// isn't optional tuning.
pub fn start_reaper_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            let result = handlers::reap_once(&state, REAPER_STALE_MINUTES).await;
            if result.get("reaped").and_then(|v| v.as_u64()).unwrap_or(0) > 0 {
                info!(?result, "daemon: reaped stale jobs");
            }
            tokio::time::sleep(Duration::from_secs(REAPER_INTERVAL_SECS)).await;
        }
    });
}
