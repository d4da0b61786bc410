//! Sector grouping and ordering.
//!
//! Ordering is recomputed from scratch on every call, so the output never
//! depends on the order in which snapshots were fetched.

use crate::{HeatmapResult, SectorGroup, TickerCatalog, TickerSnapshot};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Group `snapshots` into the catalog's sectors.
///
/// Catalog tickers with no snapshot are skipped, and a sector left with no
/// stocks is dropped. Stocks sort by market cap descending (ticker ascending
/// on ties); sectors by total market cap descending (name ascending on ties).
pub fn aggregate(
    catalog: &TickerCatalog,
    snapshots: &HashMap<String, TickerSnapshot>,
    generated_at: DateTime<Utc>,
) -> HeatmapResult {
    let mut placed: HashSet<String> = HashSet::new();
    let mut sectors: Vec<SectorGroup> = Vec::new();

    for sector in catalog.sectors() {
        let mut stocks: Vec<TickerSnapshot> = sector
            .tickers
            .iter()
            .filter_map(|t| snapshots.get(t))
            .cloned()
            .collect();

        if stocks.is_empty() {
            continue;
        }

        stocks.sort_by(compare_stocks);
        placed.extend(stocks.iter().map(|s| s.ticker.clone()));

        sectors.push(SectorGroup {
            name: sector.name.clone(),
            stocks,
        });
    }

    sectors.sort_by(|a, b| {
        b.total_market_cap()
            .cmp(&a.total_market_cap())
            .then_with(|| a.name.cmp(&b.name))
    });

    HeatmapResult {
        sectors,
        generated_at,
        ticker_count: placed.len(),
    }
}

/// Market cap descending, ticker ascending.
pub fn compare_stocks(a: &TickerSnapshot, b: &TickerSnapshot) -> Ordering {
    b.market_cap
        .cmp(&a.market_cap)
        .then_with(|| a.ticker.cmp(&b.ticker))
}
