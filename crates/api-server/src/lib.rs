use anyhow::Context;
use axum::{routing::get, Json, Router};
use heatmap_core::{dedup_tickers, TickerCatalog};
use heatmap_engine::{EngineConfig, HeatmapEngine};
use polygon_client::PolygonClient;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod compare_routes;
mod error;
mod heatmap_routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HeatmapEngine>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Served at `/` (index page and generated heatmap JSON)
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
        }
    }
}

/// Comma separated tickers, trimmed and upper-cased. Blank entries and
/// repeats are dropped, first occurrence wins.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let tickers: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();
    dedup_tickers(&tickers)
}

/// API routes without static file serving.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(heatmap_routes::heatmap_routes())
        .merge(compare_routes::compare_routes())
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn load_catalog(config: &EngineConfig) -> anyhow::Result<TickerCatalog> {
    match &config.catalog_path {
        Some(path) => TickerCatalog::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(TickerCatalog::default_sp500()),
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api_server=info,heatmap_engine=info,tower_http=info")),
        )
        .init();

    let server_config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env()?;
    let catalog = load_catalog(&engine_config)?;

    let api_key = std::env::var("POLYGON_API_KEY").context("POLYGON_API_KEY must be set")?;
    let client = Arc::new(PolygonClient::new(api_key));

    tracing::info!(
        "Catalog: {} sectors, {} tickers; {} workers, {}s per ticker, cache TTL {}s",
        catalog.sectors().len(),
        catalog.ticker_count(),
        engine_config.workers,
        engine_config.ticker_timeout.as_secs(),
        engine_config.cache_ttl.as_secs()
    );

    let state = AppState {
        engine: Arc::new(HeatmapEngine::new(client, catalog, &engine_config)),
    };
    let app = router(state).fallback_service(
        ServeDir::new(&server_config.static_dir).append_index_html_on_directories(true),
    );

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr))?;
    tracing::info!("Heatmap server listening on http://{}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping");
}
