//! In-memory market data, used by tests and offline runs.

use async_trait::async_trait;
use chrono::DateTime;
use heatmap_core::{MarketDataClient, PriceSample, ProviderError, RangeQuery, StaticInfo};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 2024-01-02 21:00 UTC, first fixture session close
const FIRST_CLOSE_TS: i64 = 1_704_229_200;
const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Default)]
struct Fixture {
    closes: Vec<Decimal>,
    info: StaticInfo,
    delay: Option<Duration>,
}

/// Serves fixed closes and reference data per ticker. Unknown tickers
/// report `NotFound`.
#[derive(Debug, Default)]
pub struct InMemoryClient {
    fixtures: HashMap<String, Fixture>,
    failures: HashMap<String, ProviderError>,
    history_calls: AtomicUsize,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(mut self, ticker: &str, closes: Vec<Decimal>, market_cap: Option<Decimal>) -> Self {
        let fixture = self.fixtures.entry(ticker.to_string()).or_default();
        fixture.closes = closes;
        fixture.info.display_name = ticker.to_string();
        fixture.info.market_cap = market_cap;
        self
    }

    pub fn with_info(mut self, ticker: &str, info: StaticInfo) -> Self {
        self.fixtures.entry(ticker.to_string()).or_default().info = info;
        self
    }

    /// Every call for `ticker` sleeps this long before answering.
    pub fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.fixtures.entry(ticker.to_string()).or_default().delay = Some(delay);
        self
    }

    pub fn with_failure(mut self, ticker: &str, error: ProviderError) -> Self {
        self.failures.insert(ticker.to_string(), error);
        self
    }

    /// Number of history requests served so far
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    async fn fixture(&self, ticker: &str) -> Result<&Fixture, ProviderError> {
        if let Some(err) = self.failures.get(ticker) {
            return Err(err.clone());
        }
        let fixture = self
            .fixtures
            .get(ticker)
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;
        if let Some(delay) = fixture.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(fixture)
    }
}

#[async_trait]
impl MarketDataClient for InMemoryClient {
    async fn get_range(&self, ticker: &str, _query: &RangeQuery) -> Result<Vec<PriceSample>, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let fixture = self.fixture(ticker).await?;

        Ok(fixture
            .closes
            .iter()
            .enumerate()
            .filter_map(|(i, close)| {
                Some(PriceSample {
                    timestamp: DateTime::from_timestamp(FIRST_CLOSE_TS + i as i64 * SECS_PER_DAY, 0)?,
                    close: *close,
                })
            })
            .collect())
    }

    async fn get_static_info(&self, ticker: &str) -> Result<StaticInfo, ProviderError> {
        Ok(self.fixture(ticker).await?.info.clone())
    }
}
