use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod api;
mod cache;
mod config;
mod error;
mod price_aggregator;
mod price_parser;
mod renderer;
mod slippage;
mod sources;
mod types;

use crate::{
    api::{create_router, AppState},
    cache::{QuoteCache, SystemClock},
    config::Config,
    price_aggregator::QuoteAggregator,
    renderer::HttpRenderer,
    sources::default_sources,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 Starting Dollar Quote Service...");

    let config = Config::from_env()?;
    let scraper = &config.scraper_config;

    let renderer = Arc::new(HttpRenderer::new(scraper.user_agent.clone(), scraper.poll_interval));
    let sources = default_sources(renderer, scraper);
    let cache = QuoteCache::new(sources, Arc::new(SystemClock)).with_ttl(scraper.cache_ttl);

    let state = AppState {
        aggregator: Arc::new(QuoteAggregator::new(Arc::new(cache))),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let port = config.server_port;

    tracing::info!("🌐 Server is running on http://localhost:{}", port);
    tracing::info!("--- Available Endpoints ---");
    tracing::info!("http://localhost:{}/quotes", port);
    tracing::info!("http://localhost:{}/average", port);
    tracing::info!("http://localhost:{}/slippage", port);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
