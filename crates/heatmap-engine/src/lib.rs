use chrono::Utc;
use heatmap_core::{
    aggregate, aggregator::compare_stocks, dedup_tickers, HeatmapError, HeatmapResult,
    MarketDataClient, Period, TickerCatalog, TickerSnapshot,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

pub mod cache;
pub mod compare;
pub mod config;
pub mod fetcher;
pub mod memory;

pub use cache::ResultCache;
pub use compare::{CompareRange, ComparePeriod, CompareSeries, TrajectoryPoint, MAX_COMPARE_TICKERS};
pub use config::EngineConfig;
pub use fetcher::{ConcurrentFetcher, FetchReport};

/// Tickers accepted by an ad-hoc heatmap request
pub const MAX_ADHOC_TICKERS: usize = 160;

/// Builds heatmaps for the catalog and caches them per period.
pub struct HeatmapEngine {
    catalog: Arc<TickerCatalog>,
    client: Arc<dyn MarketDataClient>,
    fetcher: ConcurrentFetcher,
    cache: ResultCache<Period, HeatmapResult>,
}

impl HeatmapEngine {
    pub fn new(client: Arc<dyn MarketDataClient>, catalog: TickerCatalog, config: &EngineConfig) -> Self {
        let fetcher = ConcurrentFetcher::new(Arc::clone(&client))
            .with_workers(config.workers)
            .with_ticker_timeout(config.ticker_timeout);

        Self {
            catalog: Arc::new(catalog),
            client,
            fetcher,
            cache: ResultCache::new(config.cache_ttl),
        }
    }

    /// Fetch every catalog ticker and aggregate. Never served from cache.
    pub async fn build(&self, period: Period) -> (HeatmapResult, FetchReport) {
        let tickers = self.catalog.all_tickers();
        tracing::info!(
            "Building {} heatmap for {} tickers with {} workers",
            period,
            tickers.len(),
            self.fetcher.workers()
        );

        let started = Instant::now();
        let (snapshots, report) = self.fetcher.fetch_all(&tickers, period.lookback()).await;
        let result = aggregate(&self.catalog, &snapshots, Utc::now());

        tracing::info!(
            "{} heatmap ready: {}/{} tickers in {} sectors ({} failed) in {:.1}s",
            period,
            result.ticker_count,
            report.requested,
            result.sectors.len(),
            report.failed,
            started.elapsed().as_secs_f64()
        );

        (result, report)
    }

    /// Cached heatmap for `period`, rebuilt when older than the TTL.
    /// Failed tickers are left out of the build, so it cannot fail as a whole.
    pub async fn heatmap(&self, period: Period) -> Arc<HeatmapResult> {
        let cached = self
            .cache
            .get_or_compute(&period, || async {
                let (result, _) = self.build(period).await;
                Ok::<_, Infallible>(result)
            })
            .await;
        match cached {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Resolve a caller-supplied period token, then serve from cache.
    pub async fn heatmap_for_token(&self, token: &str) -> Result<Arc<HeatmapResult>, HeatmapError> {
        let period = Period::resolve(token)?;
        Ok(self.heatmap(period).await)
    }

    /// Uncached snapshots for an arbitrary ticker list, largest first.
    /// Repeats are dropped before the list is capped.
    pub async fn snapshots(&self, tickers: &[String], period: Period) -> Vec<TickerSnapshot> {
        let mut tickers = dedup_tickers(tickers);
        tickers.truncate(MAX_ADHOC_TICKERS);
        let (snapshots, report) = self.fetcher.fetch_all(&tickers, period.lookback()).await;
        tracing::debug!("Ad-hoc fetch: {}/{} tickers", report.succeeded, report.requested);

        let mut stocks: Vec<TickerSnapshot> = snapshots.into_values().collect();
        stocks.sort_by(compare_stocks);
        stocks
    }

    pub async fn compare(&self, tickers: &[String], range: CompareRange) -> Vec<CompareSeries> {
        compare::compare(self.client.as_ref(), tickers, range, Utc::now().date_naive()).await
    }
}
