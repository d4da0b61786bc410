//! heatmap-cli: build one sector heatmap and write it as a static JSON file.
//!
//! Usage:
//!   cargo run -p heatmap-cli -- --period 1d
//!   cargo run -p heatmap-cli -- --top100 --output static/data/heatmap.json
//!   cargo run -p heatmap-cli -- --catalog sectors.toml --workers 30

mod artifact;

use anyhow::{Context, Result};
use clap::Parser;
use heatmap_core::{Period, TickerCatalog};
use heatmap_engine::{EngineConfig, HeatmapEngine};
use polygon_client::PolygonClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "heatmap-cli", about = "Generate a sector heatmap JSON file")]
struct Args {
    /// Lookback period: 1d, 1w, 1mo or 3mo.
    #[arg(long, default_value = "1d")]
    period: String,

    /// Output file.
    #[arg(long, default_value = "static/data/heatmap.json")]
    output: PathBuf,

    /// TOML catalog with [[sectors]] entries. Overrides HEATMAP_CATALOG.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Use the smaller top-100 catalog instead of the full S&P 500.
    #[arg(long, default_value_t = false, conflicts_with = "catalog")]
    top100: bool,

    /// Fetch workers (clamped to 20..=50).
    #[arg(long)]
    workers: Option<usize>,

    /// Per-ticker deadline in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heatmap_cli=info,heatmap_engine=info,polygon_client=warn".into()),
        )
        .init();

    let args = Args::parse();
    let period = Period::resolve(&args.period)?;

    let mut config = EngineConfig::from_env()?;
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_ticker_timeout(Duration::from_secs(secs));
    }

    let catalog = load_catalog(&args, &config)?;
    tracing::info!(
        "Catalog: {} sectors, {} tickers",
        catalog.sectors().len(),
        catalog.ticker_count()
    );

    let api_key = std::env::var("POLYGON_API_KEY").context("POLYGON_API_KEY must be set")?;
    let client = Arc::new(PolygonClient::new(api_key));
    let engine = HeatmapEngine::new(client, catalog, &config);

    let (result, report) = engine.build(period).await;
    artifact::write_atomic(&result, &args.output)?;

    for sector in &result.sectors {
        tracing::info!("  {:<28} {:>3} stocks", sector.name, sector.stocks.len());
    }
    tracing::info!(
        "Wrote {} ({} stocks, {} sectors, {} failed)",
        args.output.display(),
        result.ticker_count,
        result.sectors.len(),
        report.failed
    );

    Ok(())
}

fn load_catalog(args: &Args, config: &EngineConfig) -> Result<TickerCatalog> {
    if args.top100 {
        return Ok(TickerCatalog::top100());
    }
    match args.catalog.as_ref().or(config.catalog_path.as_ref()) {
        Some(path) => TickerCatalog::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(TickerCatalog::default_sp500()),
    }
}
