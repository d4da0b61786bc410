//! Lookback periods for the heatmap.
//!
//! A period decides how much history is requested from the provider and how
//! many trading days back the comparison baseline sits.

use crate::HeatmapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

/// Provider window plus baseline offset for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
    /// Calendar days of history to request
    pub window_days: i64,
    /// Trading days between the baseline sample and the latest sample
    pub comparison_offset: usize,
}

impl Lookback {
    /// Offset actually usable against `samples` closes. Short histories
    /// (recent listings) fall back to the oldest available sample.
    pub fn clamped_offset(&self, samples: usize) -> usize {
        self.comparison_offset.min(samples.saturating_sub(1))
    }
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::OneDay,
        Period::OneWeek,
        Period::OneMonth,
        Period::ThreeMonths,
    ];

    /// Parse a caller-supplied token. Unknown tokens are rejected.
    pub fn resolve(token: &str) -> Result<Self, HeatmapError> {
        match token.trim().to_lowercase().as_str() {
            "1d" | "1 day" => Ok(Period::OneDay),
            "1w" | "1 week" => Ok(Period::OneWeek),
            "1mo" | "1 month" => Ok(Period::OneMonth),
            "3mo" | "3 months" => Ok(Period::ThreeMonths),
            _ => Err(HeatmapError::InvalidPeriod(token.to_string())),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::OneWeek => "1w",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
        }
    }

    pub fn lookback(&self) -> Lookback {
        let (window_days, comparison_offset) = match self {
            Period::OneDay => (5, 1),
            Period::OneWeek => (31, 5),
            Period::OneMonth => (92, 21),
            Period::ThreeMonths => (365, 63),
        };
        Lookback {
            window_days,
            comparison_offset,
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::OneDay
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Period {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::resolve(s)
    }
}
