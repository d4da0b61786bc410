use crate::HeatmapError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Percentage move between a baseline close and the latest close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub baseline: Decimal,
    pub last: Decimal,
    /// Percent, rounded to 2 dp
    pub change_pct: Decimal,
}

/// Round half away from zero to `dp` decimal places.
pub fn round_ratio(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the change from the close `offset` samples before the last one.
///
/// `closes` must be ascending by time. The offset is clamped to the
/// available history.
pub fn compute_change(ticker: &str, closes: &[Decimal], offset: usize) -> Result<PriceChange, HeatmapError> {
    if closes.len() < 2 {
        return Err(HeatmapError::InsufficientHistory {
            ticker: ticker.to_string(),
            samples: closes.len(),
        });
    }

    let last_idx = closes.len() - 1;
    let offset = offset.min(last_idx);
    let baseline = closes[last_idx - offset];
    let last = closes[last_idx];

    if baseline.is_zero() {
        return Err(HeatmapError::DivisionByZero {
            ticker: ticker.to_string(),
        });
    }
    let pct = percent_change(baseline, last).ok_or_else(|| HeatmapError::Overflow {
        ticker: ticker.to_string(),
    })?;

    Ok(PriceChange {
        baseline,
        last,
        change_pct: round_ratio(pct, 2),
    })
}

/// `(last - baseline) / baseline * 100`, or `None` when the baseline is
/// zero or the result does not fit a `Decimal`.
pub fn percent_change(baseline: Decimal, last: Decimal) -> Option<Decimal> {
    last.checked_sub(baseline)?
        .checked_div(baseline)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
