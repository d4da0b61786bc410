use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market cap assumed when the provider does not report one (1B).
pub const DEFAULT_MARKET_CAP: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// One closing price from a provider history, ascending by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub close: Decimal,
}

/// Slowly-changing reference data for a ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticInfo {
    pub display_name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub trailing_pe: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub forward_pe: Option<Decimal>,
}

/// Bar spacing for a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    Minute5,
    Minute15,
    Hour1,
    Day1,
}

impl Interval {
    /// (multiplier, timespan) as understood by aggregate-bar endpoints
    pub fn to_span(&self) -> (u32, &'static str) {
        match self {
            Interval::Minute5 => (5, "minute"),
            Interval::Minute15 => (15, "minute"),
            Interval::Hour1 => (1, "hour"),
            Interval::Day1 => (1, "day"),
        }
    }
}

/// Historical range request: inclusive calendar dates plus bar spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub interval: Interval,
}

impl RangeQuery {
    /// Daily bars covering the last `window_days` calendar days up to `today`.
    pub fn trailing_days(today: NaiveDate, window_days: i64) -> Self {
        Self {
            from: today - chrono::Duration::days(window_days),
            to: today,
            interval: Interval::Day1,
        }
    }
}

/// Per-ticker entry of a heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "change", with = "rust_decimal::serde::float")]
    pub change_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub market_cap: Decimal,
    #[serde(rename = "pe", with = "rust_decimal::serde::float_option")]
    pub pe_ratio: Option<Decimal>,
    #[serde(rename = "fwdPe", with = "rust_decimal::serde::float_option")]
    pub forward_pe_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorGroup {
    pub name: String,
    pub stocks: Vec<TickerSnapshot>,
}

impl SectorGroup {
    pub fn total_market_cap(&self) -> Decimal {
        self.stocks.iter().map(|s| s.market_cap).sum()
    }
}

/// Fully assembled heatmap. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapResult {
    pub sectors: Vec<SectorGroup>,
    #[serde(rename = "updated")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "count")]
    pub ticker_count: usize,
}

impl HeatmapResult {
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            sectors: Vec::new(),
            generated_at,
            ticker_count: 0,
        }
    }
}
