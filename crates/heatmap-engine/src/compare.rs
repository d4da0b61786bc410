//! Cumulative return trajectories for side-by-side comparison.

use chrono::{FixedOffset, NaiveDate};
use futures_util::future::join_all;
use heatmap_core::{percent_change, round_ratio, Interval, MarketDataClient, PriceSample, RangeQuery};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_COMPARE_TICKERS: usize = 6;

/// US Eastern standard time, used to split intraday bars into sessions
const SESSION_UTC_OFFSET_SECS: i32 = -5 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparePeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "max")]
    Max,
}

impl ComparePeriod {
    /// Unrecognized tokens fall back to one month.
    pub fn parse_or_default(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "1d" => ComparePeriod::OneDay,
            "5d" => ComparePeriod::FiveDays,
            "3mo" => ComparePeriod::ThreeMonths,
            "6mo" => ComparePeriod::SixMonths,
            "1y" => ComparePeriod::OneYear,
            "max" => ComparePeriod::Max,
            _ => ComparePeriod::OneMonth,
        }
    }

    /// Calendar days of history. The one-day window spans a weekend and is
    /// trimmed to its last session afterwards.
    pub fn window_days(&self) -> i64 {
        match self {
            ComparePeriod::OneDay => 5,
            ComparePeriod::FiveDays => 7,
            ComparePeriod::OneMonth => 31,
            ComparePeriod::ThreeMonths => 92,
            ComparePeriod::SixMonths => 183,
            ComparePeriod::OneYear => 365,
            ComparePeriod::Max => 365 * 20,
        }
    }

    /// Shorter periods use intraday bars
    pub fn interval(&self) -> Interval {
        match self {
            ComparePeriod::OneDay => Interval::Minute5,
            ComparePeriod::FiveDays => Interval::Minute15,
            ComparePeriod::OneMonth => Interval::Hour1,
            _ => Interval::Day1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareRange {
    Period(ComparePeriod),
    /// Explicit date range, daily bars
    Dates { from: NaiveDate, to: NaiveDate },
}

impl CompareRange {
    pub fn to_query(&self, today: NaiveDate) -> RangeQuery {
        match *self {
            CompareRange::Period(period) => RangeQuery {
                from: today - chrono::Duration::days(period.window_days()),
                to: today,
                interval: period.interval(),
            },
            CompareRange::Dates { from, to } => RangeQuery {
                from,
                to,
                interval: Interval::Day1,
            },
        }
    }

    fn single_session(&self) -> bool {
        matches!(self, CompareRange::Period(ComparePeriod::OneDay))
    }
}

/// The bars belonging to the same trading date as the last bar.
pub fn last_session(samples: &[PriceSample]) -> &[PriceSample] {
    let Some(offset) = FixedOffset::east_opt(SESSION_UTC_OFFSET_SECS) else {
        return samples;
    };
    let session_date = |s: &PriceSample| s.timestamp.with_timezone(&offset).date_naive();
    let Some(last_date) = samples.last().map(session_date) else {
        return samples;
    };
    let start = samples
        .iter()
        .rposition(|s| session_date(s) != last_date)
        .map_or(0, |i| i + 1);
    &samples[start..]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    /// Unix seconds
    pub time: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareSeries {
    pub ticker: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "return", with = "rust_decimal::serde::float")]
    pub total_return: Decimal,
    pub data: Vec<TrajectoryPoint>,
}

/// Percent return of every sample relative to the first one. `None` for an
/// empty history, a zero first close or a return out of `Decimal` range.
pub fn trajectory(ticker: &str, name: &str, samples: &[PriceSample]) -> Option<CompareSeries> {
    let first = samples.first()?.close;
    let last = samples.last()?.close;
    if first.is_zero() {
        return None;
    }

    let pct = |close: Decimal| percent_change(first, close).map(|r| round_ratio(r, 2));
    let data = samples
        .iter()
        .map(|s| {
            Some(TrajectoryPoint {
                time: s.timestamp.timestamp(),
                value: pct(s.close)?,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(CompareSeries {
        ticker: ticker.to_string(),
        name: name.to_string(),
        price: round_ratio(last, 2),
        total_return: pct(last)?,
        data,
    })
}

/// Trajectories for at most MAX_COMPARE_TICKERS tickers, in request order.
/// Tickers without usable history are left out.
pub async fn compare(
    client: &dyn MarketDataClient,
    tickers: &[String],
    range: CompareRange,
    today: NaiveDate,
) -> Vec<CompareSeries> {
    let query = range.to_query(today);

    let requests = tickers.iter().take(MAX_COMPARE_TICKERS).map(|ticker| async move {
        let (history, info) = tokio::join!(client.get_range(ticker, &query), client.get_static_info(ticker));

        let samples = match history {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!("Compare: no history for {}: {}", ticker, e);
                return None;
            }
        };
        let name = match info {
            Ok(info) if !info.display_name.is_empty() => info.display_name,
            _ => ticker.clone(),
        };
        let samples = if range.single_session() {
            last_session(&samples)
        } else {
            &samples[..]
        };
        trajectory(ticker, &name, samples)
    });

    join_all(requests).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryClient;
    use chrono::{DateTime, Utc};
    use heatmap_core::ProviderError;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_period_fallback() {
        assert_eq!(ComparePeriod::parse_or_default("6mo"), ComparePeriod::SixMonths);
        assert_eq!(ComparePeriod::parse_or_default("bogus"), ComparePeriod::OneMonth);
        assert_eq!(ComparePeriod::OneDay.interval(), Interval::Minute5);
        assert_eq!(ComparePeriod::OneYear.interval(), Interval::Day1);
    }

    #[test]
    fn test_date_range_overrides_period() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let query = CompareRange::Dates { from, to }.to_query(today());
        assert_eq!(query.from, from);
        assert_eq!(query.interval, Interval::Day1);

        let query = CompareRange::Period(ComparePeriod::FiveDays).to_query(today());
        assert_eq!(query.from, NaiveDate::from_ymd_opt(2024, 5, 27).unwrap());
        assert_eq!(query.to, today());
    }

    #[test]
    fn test_trajectory_relative_to_first_close() {
        let samples: Vec<PriceSample> = [dec!(50), dec!(55), dec!(45)]
            .iter()
            .map(|c| PriceSample {
                timestamp: Utc::now(),
                close: *c,
            })
            .collect();

        let series = trajectory("X", "Example", &samples).unwrap();
        let values: Vec<Decimal> = series.data.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(0), dec!(10), dec!(-10)]);
        assert_eq!(series.total_return, dec!(-10));
        assert_eq!(series.price, dec!(45));

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["return"], -10.0);
        assert!(json["data"][0]["time"].is_i64());
    }

    #[test]
    fn test_trajectory_needs_nonzero_history() {
        assert!(trajectory("X", "X", &[]).is_none());
        let zero = [PriceSample {
            timestamp: Utc::now(),
            close: dec!(0),
        }];
        assert!(trajectory("X", "X", &zero).is_none());
    }

    #[test]
    fn test_trajectory_out_of_range_is_dropped() {
        let samples = [
            PriceSample {
                timestamp: Utc::now(),
                close: Decimal::new(1, 27),
            },
            PriceSample {
                timestamp: Utc::now(),
                close: dec!(1),
            },
        ];
        assert!(trajectory("TINY", "TINY", &samples).is_none());
    }

    #[test]
    fn test_one_day_window_reaches_friday_from_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let query = CompareRange::Period(ComparePeriod::OneDay).to_query(sunday);
        assert!(query.from <= NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(query.to, sunday);
        assert_eq!(query.interval, Interval::Minute5);
    }

    fn bar(ts: i64, close: Decimal) -> PriceSample {
        PriceSample {
            timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
            close,
        }
    }

    #[test]
    fn test_last_session_keeps_final_trading_day() {
        // Thu 2024-05-30 15:55 ET, Fri 2024-05-31 09:30 / 16:00 ET (UTC-5 fixed)
        let samples = [
            bar(1_717_102_500, dec!(100)),
            bar(1_717_165_800, dec!(200)),
            bar(1_717_189_200, dec!(210)),
        ];
        let session = last_session(&samples);
        assert_eq!(session.len(), 2);
        assert_eq!(session[0].close, dec!(200));

        let series = trajectory("X", "X", session).unwrap();
        assert_eq!(series.total_return, dec!(5));
        assert!(last_session(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_one_day_compare_on_weekend_uses_last_session() {
        let client = InMemoryClient::new().with_ticker("X", vec![dec!(10), dec!(12), dec!(15)], None);
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let series = compare(&client, &["X".to_string()], CompareRange::Period(ComparePeriod::OneDay), sunday).await;

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].data.len(), 1);
        assert_eq!(series[0].price, dec!(15));
        assert_eq!(series[0].total_return, dec!(0));
    }

    #[tokio::test]
    async fn test_compare_keeps_order_and_caps_tickers() {
        let mut client = InMemoryClient::new().with_failure("BAD", ProviderError::Network("down".into()));
        let tickers: Vec<String> = ["BAD", "A", "B", "C", "D", "E", "F"].iter().map(|t| t.to_string()).collect();
        for t in &tickers[1..] {
            client = client.with_ticker(t, vec![dec!(10), dec!(12)], None);
        }

        let series = compare(&client, &tickers, CompareRange::Period(ComparePeriod::OneMonth), today()).await;
        let names: Vec<&str> = series.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(series[0].total_return, dec!(20));
    }
}
