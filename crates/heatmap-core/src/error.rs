use thiserror::Error;

/// Failure reported by a market data provider for a single request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Symbol not found: {0}")]
    NotFound(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeatmapError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    #[error("Insufficient history for {ticker}: {samples} samples")]
    InsufficientHistory { ticker: String, samples: usize },

    #[error("Zero baseline price for {ticker}")]
    DivisionByZero { ticker: String },

    #[error("Price change for {ticker} out of range")]
    Overflow { ticker: String },

    #[error("Timed out fetching {ticker}")]
    Timeout { ticker: String },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl HeatmapError {
    /// Failures that only make one ticker absent from a heatmap.
    pub fn is_per_ticker(&self) -> bool {
        matches!(
            self,
            HeatmapError::Fetch(_)
                | HeatmapError::InsufficientHistory { .. }
                | HeatmapError::DivisionByZero { .. }
                | HeatmapError::Overflow { .. }
                | HeatmapError::Timeout { .. }
        )
    }
}
