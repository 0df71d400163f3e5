use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pipeline_api::{build_router, AppState};
use pipeline_common::Config;
use pipeline_db::Store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pipeline=info".parse()?))
        .json()
        .init();

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    let state = Arc::new(AppState::new(store, config));

    pipeline_api::daemon::start_reaper_loop(state.clone());
    if state.config.scrape_interval_ms > 0 {
        pipeline_api::daemon::start_interval_loop(state.clone());
    }

    let app = build_router(state);

    let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("API_PORT").or_else(|_| std::env::var("PORT")).unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{host}:{port}");

    tracing::info!(%addr, "pipeline-api starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
