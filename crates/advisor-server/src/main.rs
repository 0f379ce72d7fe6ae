//! portfolio-advisor HTTP Server
//!
//! Axum-based server exposing the advisor pipeline as a REST API.
//! The market data backend is chosen at startup via `MARKET_PROVIDER`
//! (`mock` or `coingecko`).

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use advisor_core::market::{CoinGeckoClient, MarketDataProvider, MockMarketData};
use advisor_core::Advisor;

use crate::handlers::{asset_metrics, health_check, market_overview, recommend};
use crate::state::AppState;

fn build_provider() -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    let choice = std::env::var("MARKET_PROVIDER").unwrap_or_else(|_| "mock".into());
    match choice.as_str() {
        "coingecko" => Ok(Arc::new(CoinGeckoClient::from_env()?)),
        "mock" => Ok(Arc::new(MockMarketData::new())),
        other => anyhow::bail!("unknown MARKET_PROVIDER: {other} (use mock or coingecko)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let provider = build_provider()?;
    tracing::info!(provider = provider.name(), "market data provider configured");

    if provider.health_check().await {
        tracing::info!("✓ Market data provider reachable");
    } else {
        tracing::warn!("⚠ Market data provider unreachable - requests will fail");
    }

    let state = AppState {
        advisor: Arc::new(Advisor::new(provider)),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/assets/{symbol}/metrics", get(asset_metrics))
        .route("/api/recommendation", post(recommend))
        .route("/api/market/overview", get(market_overview))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 portfolio-advisor server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  GET  /api/assets/{{symbol}}/metrics - Asset metrics");
    tracing::info!("  POST /api/recommendation          - Portfolio recommendation");
    tracing::info!("  GET  /api/market/overview         - Market overview");

    axum::serve(listener, app).await?;

    Ok(())
}
