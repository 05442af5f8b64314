mod blog;
mod chat;
mod config;
mod documents;
mod errors;
mod humanize;
mod llm_client;
mod reader;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SciStu API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone())?;

    let providers = state.llm.registry().configured_providers();
    if providers.is_empty() {
        warn!("No LLM provider keys configured; model-backed endpoints will fail");
    } else {
        let names: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
        info!("LLM providers configured: {}", names.join(", "));
    }
    info!(
        "Resume analyzer: {}, humanize limit: {} per {}s, blog posts: {}",
        state.resume_analyzer.backend(),
        config.humanize_rate_limit,
        config.humanize_window_secs,
        state.blog.len()
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
