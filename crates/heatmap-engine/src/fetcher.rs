//! Bounded fan-out over the market data provider.
//!
//! A fixed pool of workers drains a shared queue of tickers. Each ticker is
//! fetched in isolation under its own deadline; any failure only makes that
//! ticker absent from the result.

use crate::config::{DEFAULT_TICKER_TIMEOUT_SECS, DEFAULT_WORKERS};
use heatmap_core::{
    compute_change, dedup_tickers, round_ratio, HeatmapError, Lookback, MarketDataClient,
    TickerSnapshot, DEFAULT_MARKET_CAP,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Outcome counts for one fetch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ConcurrentFetcher {
    client: Arc<dyn MarketDataClient>,
    workers: usize,
    ticker_timeout: Duration,
}

impl ConcurrentFetcher {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self {
            client,
            workers: DEFAULT_WORKERS,
            ticker_timeout: Duration::from_secs(DEFAULT_TICKER_TIMEOUT_SECS),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_ticker_timeout(mut self, timeout: Duration) -> Self {
        self.ticker_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetch a snapshot for every distinct ticker. Tickers that fail are
    /// not keys of the returned map.
    pub async fn fetch_all(
        &self,
        tickers: &[String],
        lookback: Lookback,
    ) -> (HashMap<String, TickerSnapshot>, FetchReport) {
        let tickers = dedup_tickers(tickers);
        let mut report = FetchReport {
            requested: tickers.len(),
            ..Default::default()
        };
        if tickers.is_empty() {
            return (HashMap::new(), report);
        }

        let worker_count = self.workers.min(tickers.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(tickers)));
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let client = Arc::clone(&self.client);
            let results = results_tx.clone();
            let deadline = self.ticker_timeout;

            workers.spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some(ticker) = next else { break };

                    // One task per ticker so a panic only loses that ticker
                    let fetch = tokio::spawn(fetch_with_deadline(
                        Arc::clone(&client),
                        ticker.clone(),
                        lookback,
                        deadline,
                    ));
                    let outcome = match fetch.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!("Fetch task for {} failed: {}", ticker, e);
                            continue;
                        }
                    };
                    if results.send((ticker, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(results_tx);

        let mut snapshots = HashMap::new();
        while let Some((ticker, outcome)) = results_rx.recv().await {
            match outcome {
                Ok(snapshot) => {
                    snapshots.insert(ticker, snapshot);
                }
                Err(e @ HeatmapError::InsufficientHistory { .. }) => {
                    tracing::debug!("Skipping {}: {}", ticker, e);
                }
                Err(e) if e.is_per_ticker() => {
                    tracing::warn!("Failed to fetch {}: {}", ticker, e);
                }
                Err(e) => {
                    tracing::error!("Unexpected error fetching {}: {}", ticker, e);
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Fetch worker failed: {}", e);
            }
        }

        report.succeeded = snapshots.len();
        report.failed = report.requested - report.succeeded;
        (snapshots, report)
    }
}

async fn fetch_with_deadline(
    client: Arc<dyn MarketDataClient>,
    ticker: String,
    lookback: Lookback,
    deadline: Duration,
) -> Result<TickerSnapshot, HeatmapError> {
    match tokio::time::timeout(deadline, fetch_snapshot(client.as_ref(), &ticker, lookback)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(HeatmapError::Timeout { ticker }),
    }
}

/// History and reference data are requested together; both must succeed.
pub async fn fetch_snapshot(
    client: &dyn MarketDataClient,
    ticker: &str,
    lookback: Lookback,
) -> Result<TickerSnapshot, HeatmapError> {
    let (history, info) = tokio::join!(
        client.get_history(ticker, lookback.window_days),
        client.get_static_info(ticker),
    );
    let history = history?;
    let info = info?;

    let closes: Vec<Decimal> = history.iter().map(|s| s.close).collect();
    let change = compute_change(ticker, &closes, lookback.comparison_offset)?;

    Ok(TickerSnapshot {
        ticker: ticker.to_string(),
        price: round_ratio(change.last, 2),
        change_pct: change.change_pct,
        market_cap: info.market_cap.unwrap_or(DEFAULT_MARKET_CAP),
        pe_ratio: info.trailing_pe.map(|pe| round_ratio(pe, 1)),
        forward_pe_ratio: info.forward_pe.map(|pe| round_ratio(pe, 1)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryClient;
    use async_trait::async_trait;
    use heatmap_core::{Period, PriceSample, ProviderError, RangeQuery, StaticInfo};
    use rust_decimal_macros::dec;

    /// Delegates to an in-memory client but panics on one ticker.
    struct PanicsOn {
        inner: InMemoryClient,
        ticker: &'static str,
    }

    #[async_trait]
    impl MarketDataClient for PanicsOn {
        async fn get_range(&self, ticker: &str, query: &RangeQuery) -> Result<Vec<PriceSample>, ProviderError> {
            if ticker == self.ticker {
                panic!("malformed payload for {ticker}");
            }
            self.inner.get_range(ticker, query).await
        }

        async fn get_static_info(&self, ticker: &str) -> Result<StaticInfo, ProviderError> {
            self.inner.get_static_info(ticker).await
        }
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_snapshot_fields() {
        let client = InMemoryClient::new().with_info(
            "AAPL",
            StaticInfo {
                display_name: "Apple".to_string(),
                market_cap: Some(dec!(3000000000000)),
                trailing_pe: Some(dec!(29.456)),
                forward_pe: Some(dec!(27.04)),
            },
        );
        let client = client.with_ticker("AAPL", vec![dec!(180), dec!(189.2549)], Some(dec!(3000000000000)));

        let snap = fetch_snapshot(&client, "AAPL", Period::OneDay.lookback()).await.unwrap();
        assert_eq!(snap.price, dec!(189.25));
        assert_eq!(snap.change_pct, dec!(5.14));
        assert_eq!(snap.pe_ratio, Some(dec!(29.5)));
        assert_eq!(snap.forward_pe_ratio, Some(dec!(27.0)));
    }

    #[tokio::test]
    async fn test_missing_market_cap_defaults() {
        let client = InMemoryClient::new().with_ticker("NEW", vec![dec!(10), dec!(11)], None);
        let snap = fetch_snapshot(&client, "NEW", Period::OneDay.lookback()).await.unwrap();
        assert_eq!(snap.market_cap, DEFAULT_MARKET_CAP);
        assert_eq!(snap.change_pct, dec!(10.00));
    }

    #[tokio::test]
    async fn test_failures_are_absent() {
        let client = InMemoryClient::new()
            .with_ticker("OK", vec![dec!(100), dec!(101)], Some(dec!(5)))
            .with_ticker("SHORT", vec![dec!(100)], Some(dec!(5)))
            .with_ticker("ZERO", vec![dec!(0), dec!(3)], Some(dec!(5)))
            .with_failure("LIMIT", ProviderError::RateLimited("LIMIT".into()));
        let fetcher = ConcurrentFetcher::new(Arc::new(client)).with_workers(2);

        let (snaps, report) = fetcher
            .fetch_all(&tickers(&["OK", "SHORT", "ZERO", "LIMIT", "GONE"]), Period::OneDay.lookback())
            .await;

        assert_eq!(snaps.len(), 1);
        assert!(snaps.contains_key("OK"));
        assert_eq!(
            report,
            FetchReport {
                requested: 5,
                succeeded: 1,
                failed: 4
            }
        );
    }

    #[tokio::test]
    async fn test_every_ticker_fetched_once() {
        let mut client = InMemoryClient::new();
        let names: Vec<String> = (0..120).map(|i| format!("T{i}")).collect();
        for name in &names {
            client = client.with_ticker(name, vec![dec!(1), dec!(2)], None);
        }
        let client = Arc::new(client);
        let fetcher = ConcurrentFetcher::new(client.clone()).with_workers(20);

        let (snaps, report) = fetcher.fetch_all(&names, Period::OneWeek.lookback()).await;
        assert_eq!(snaps.len(), 120);
        assert_eq!(report.failed, 0);
        assert_eq!(client.history_calls(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_ticker_cut_off() {
        let client = InMemoryClient::new()
            .with_ticker("FAST", vec![dec!(1), dec!(2)], None)
            .with_ticker("HANG", vec![dec!(1), dec!(2)], None)
            .with_delay("HANG", Duration::from_secs(3600));
        let fetcher = ConcurrentFetcher::new(Arc::new(client)).with_ticker_timeout(Duration::from_secs(15));

        let started = tokio::time::Instant::now();
        let (snaps, report) = fetcher
            .fetch_all(&tickers(&["FAST", "HANG"]), Period::OneDay.lookback())
            .await;

        assert!(snaps.contains_key("FAST"));
        assert!(!snaps.contains_key("HANG"));
        assert_eq!(report.failed, 1);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let fetcher = ConcurrentFetcher::new(Arc::new(InMemoryClient::new()));
        let (snaps, report) = fetcher.fetch_all(&[], Period::OneDay.lookback()).await;
        assert!(snaps.is_empty());
        assert_eq!(report, FetchReport::default());
    }

    #[tokio::test]
    async fn test_panic_loses_only_its_ticker() {
        let inner = InMemoryClient::new()
            .with_ticker("OK", vec![dec!(100), dec!(101)], None)
            .with_ticker("BOOM", vec![dec!(100), dec!(101)], None)
            .with_ticker("LATE", vec![dec!(10), dec!(12)], None);
        let client = Arc::new(PanicsOn { inner, ticker: "BOOM" });
        let fetcher = ConcurrentFetcher::new(client).with_workers(1);

        let (snaps, report) = fetcher
            .fetch_all(&tickers(&["OK", "BOOM", "LATE"]), Period::OneDay.lookback())
            .await;

        assert!(snaps.contains_key("OK"));
        assert!(snaps.contains_key("LATE"));
        assert!(!snaps.contains_key("BOOM"));
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_tiny_baseline_does_not_sink_siblings() {
        let client = InMemoryClient::new()
            .with_ticker("OK", vec![dec!(100), dec!(101)], None)
            .with_ticker("TINY", vec![Decimal::new(1, 27), dec!(1)], None);
        let fetcher = ConcurrentFetcher::new(Arc::new(client)).with_workers(1);

        let (snaps, report) = fetcher
            .fetch_all(&tickers(&["OK", "TINY"]), Period::OneDay.lookback())
            .await;

        assert_eq!(snaps["OK"].change_pct, dec!(1.00));
        assert!(!snaps.contains_key("TINY"));
        assert_eq!(
            report,
            FetchReport {
                requested: 2,
                succeeded: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_duplicate_tickers_fetched_once() {
        let client = Arc::new(InMemoryClient::new().with_ticker("A", vec![dec!(1), dec!(2)], None));
        let fetcher = ConcurrentFetcher::new(client.clone());

        let (snaps, report) = fetcher.fetch_all(&tickers(&["A", "A"]), Period::OneDay.lookback()).await;

        assert_eq!(snaps.len(), 1);
        assert_eq!(report.requested, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(client.history_calls(), 1);
    }
}
