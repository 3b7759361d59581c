mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::orchestrator::RetryPolicy;
use crate::llm_client::{GroqClient, ModelConfig};
use crate::rate_limit::DailyQuota;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CopyGen API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed daily quota
    let redis = redis::Client::open(config.redis_url.clone())?;
    let quota = DailyQuota::new(redis, config.free_tier_daily_limit);
    info!(
        "Rate limiter initialized ({} generations/day)",
        config.free_tier_daily_limit
    );

    // Initialize LLM transport
    let llm = Arc::new(GroqClient::new(
        config.groq_api_key.clone(),
        config.groq_base_url.clone(),
    )?);
    info!("LLM transport initialized (model: {})", config.groq_model);

    let mut model_config = ModelConfig::new(config.groq_model.clone());
    model_config.max_tokens = config.groq_max_tokens;
    model_config.temperature = config.groq_temperature;

    // Build app state
    let state = AppState {
        db,
        quota,
        llm,
        model_config,
        retry_policy: RetryPolicy::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
