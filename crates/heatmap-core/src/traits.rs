use async_trait::async_trait;
use chrono::Utc;
use crate::{PriceSample, ProviderError, RangeQuery, StaticInfo};

/// Source of price history and reference data for tickers.
///
/// Implemented by the Polygon REST client and by in-memory fakes in tests.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Closing prices for `ticker` over `query`, ascending by time.
    async fn get_range(&self, ticker: &str, query: &RangeQuery) -> Result<Vec<PriceSample>, ProviderError>;

    async fn get_static_info(&self, ticker: &str) -> Result<StaticInfo, ProviderError>;

    /// Daily closes for the trailing `window_days` calendar days.
    async fn get_history(&self, ticker: &str, window_days: i64) -> Result<Vec<PriceSample>, ProviderError> {
        let query = RangeQuery::trailing_days(Utc::now().date_naive(), window_days);
        self.get_range(ticker, &query).await
    }
}
