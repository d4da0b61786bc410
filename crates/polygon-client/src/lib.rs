use async_trait::async_trait;
use chrono::DateTime;
use heatmap_core::{MarketDataClient, PriceSample, ProviderError, RangeQuery, StaticInfo};
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";

/// Quarters summed for trailing-twelve-month EPS
const TTM_QUARTERS: usize = 4;

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(30))
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request and map transport failures and error statuses.
    async fn send_request(
        &self,
        symbol: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = builder
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("{symbol}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(symbol, status, &body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        symbol: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self.send_request(symbol, self.client.get(url).query(query)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{symbol}: {e}")))
    }

    /// Get aggregate closes for a symbol
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        query: &RangeQuery,
    ) -> Result<Vec<PriceSample>, ProviderError> {
        let (multiplier, timespan) = query.interval.to_span();
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            provider_symbol(symbol),
            multiplier,
            timespan,
            query.from.format("%Y-%m-%d"),
            query.to.format("%Y-%m-%d")
        );

        let response: AggregateResponse = self
            .get_json(
                symbol,
                &url,
                &[("adjusted", "true"), ("sort", "asc"), ("limit", "50000")],
            )
            .await?;

        Ok(to_samples(response.results))
    }

    /// Get ticker details (name, market cap)
    pub async fn get_ticker_details(&self, symbol: &str) -> Result<TickerDetails, ProviderError> {
        let url = format!(
            "{}/v3/reference/tickers/{}",
            self.base_url,
            provider_symbol(symbol)
        );
        let response: TickerDetailsResponse = self.get_json(symbol, &url, &[]).await?;
        Ok(response.results)
    }

    /// Previous session close
    pub async fn get_previous_close(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/prev",
            self.base_url,
            provider_symbol(symbol)
        );
        let response: AggregateResponse = self.get_json(symbol, &url, &[("adjusted", "true")]).await?;
        Ok(response.results.last().map(|r| r.c))
    }

    /// Trailing twelve month basic EPS from the latest quarterly filings
    pub async fn get_ttm_eps(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let url = format!("{}/vX/reference/financials", self.base_url);
        let ticker = provider_symbol(symbol);
        let limit = TTM_QUARTERS.to_string();
        let response: FinancialsResponse = self
            .get_json(
                symbol,
                &url,
                &[
                    ("ticker", ticker.as_str()),
                    ("timeframe", "quarterly"),
                    ("order", "desc"),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;

        Ok(ttm_eps(&response.results))
    }
}

#[async_trait]
impl MarketDataClient for PolygonClient {
    async fn get_range(
        &self,
        ticker: &str,
        query: &RangeQuery,
    ) -> Result<Vec<PriceSample>, ProviderError> {
        self.get_aggregates(ticker, query).await
    }

    async fn get_static_info(&self, ticker: &str) -> Result<StaticInfo, ProviderError> {
        let (details, prev_close, eps) = tokio::join!(
            self.get_ticker_details(ticker),
            self.get_previous_close(ticker),
            self.get_ttm_eps(ticker),
        );
        let details = details?;

        let trailing_pe = match (prev_close, eps) {
            (Ok(Some(price)), Ok(Some(eps))) => pe_ratio(price, eps),
            (price, eps) => {
                if let Some(e) = price.as_ref().err().or(eps.as_ref().err()) {
                    tracing::debug!("No trailing P/E for {}: {}", ticker, e);
                }
                None
            }
        };

        Ok(StaticInfo {
            display_name: details.name,
            market_cap: details.market_cap.and_then(Decimal::from_f64),
            trailing_pe,
            // Polygon publishes no forward estimates
            forward_pe: None,
        })
    }
}

/// Polygon writes share classes with a dot (BRK.B), catalogs often use a dash.
pub fn provider_symbol(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('-', ".")
}

fn classify_status(symbol: &str, status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(symbol.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(symbol.to_string()),
        s if s.is_server_error() => ProviderError::Network(format!("{symbol}: HTTP {s}")),
        s => ProviderError::InvalidResponse(format!("{symbol}: HTTP {s}: {body}")),
    }
}

fn to_samples(results: Vec<AggregateResult>) -> Vec<PriceSample> {
    let mut samples: Vec<PriceSample> = results
        .into_iter()
        .filter_map(|r| {
            Some(PriceSample {
                timestamp: DateTime::from_timestamp_millis(r.t)?,
                close: Decimal::from_f64(r.c)?,
            })
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Sum of the last four quarterly EPS values, `None` if any is missing.
fn ttm_eps(results: &[FinancialResult]) -> Option<f64> {
    if results.len() < TTM_QUARTERS {
        return None;
    }
    results
        .iter()
        .take(TTM_QUARTERS)
        .map(|r| {
            r.financials
                .income_statement
                .get("basic_earnings_per_share")
                .and_then(|v| v.get("value"))
                .and_then(|v| v.as_f64())
        })
        .sum()
}

fn pe_ratio(price: f64, eps: f64) -> Option<Decimal> {
    if eps > 0.0 && price > 0.0 {
        Decimal::from_f64(price / eps)
    } else {
        None
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp (ms)
    c: f64, // close
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialResult>,
}

#[derive(Debug, Deserialize)]
struct FinancialResult {
    financials: FinancialStatements,
}

#[derive(Debug, Deserialize)]
struct FinancialStatements {
    #[serde(default)]
    income_statement: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub currency_name: Option<String>,
}
