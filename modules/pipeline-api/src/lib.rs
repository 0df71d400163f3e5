pub mod daemon;
mod handlers;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the axum router (§6): `/coordinator`, `/worker`,
/// `/discovery-worker`, `/healer`, plus `/` and `/health` liveness/readiness
/// probes. Mirrors the teacher's `rootsignal-api::main` router-assembly
/// shape, minus the GraphQL/admin/REST surfaces that belong to the
/// out-of-scope consumer UI.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/coordinator", post(handlers::coordinator))
        .route("/worker", post(handlers::worker))
        .route("/discovery-worker", post(handlers::discovery_worker))
        .route("/healer", post(handlers::healer))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
