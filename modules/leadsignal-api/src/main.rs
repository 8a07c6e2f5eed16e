use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadsignal_common::Config;
use leadsignal_pipeline::{LeadPipeline, SessionRegistry};

mod rest;

/// How often the registry sweeps expired sessions.
const EVICTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct AppState {
    pub pipeline: LeadPipeline,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leadsignal=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let registry = SessionRegistry::new(Duration::from_secs(config.session_ttl_minutes * 60));
    let _sweeper = registry.spawn_eviction_sweeper(EVICTION_SWEEP_INTERVAL);

    let pipeline = LeadPipeline::from_config(&config, pool, registry);
    let state = Arc::new(AppState { pipeline });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Lead generation pipeline
        .route("/api/leads/generate", post(rest::generate_leads))
        .route(
            "/api/leads/generate/{session_id}/status",
            get(rest::generation_status),
        )
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr, "LeadSignal API listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
