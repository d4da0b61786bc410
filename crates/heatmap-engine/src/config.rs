use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 50;
pub const MIN_WORKERS: usize = 20;
pub const MAX_WORKERS: usize = 50;
pub const DEFAULT_TICKER_TIMEOUT_SECS: u64 = 15;
pub const CACHE_TTL_SECS: u64 = 300; // 5 minutes

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fetch workers, always within MIN_WORKERS..=MAX_WORKERS
    pub workers: usize,
    /// Deadline for fetching one ticker
    pub ticker_timeout: Duration,
    pub cache_ttl: Duration,
    /// TOML catalog replacing the built-in S&P 500 one
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            ticker_timeout: Duration::from_secs(DEFAULT_TICKER_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let workers: usize = env::var("HEATMAP_WORKERS")
            .unwrap_or_else(|_| DEFAULT_WORKERS.to_string())
            .parse()
            .context("HEATMAP_WORKERS must be a positive integer")?;
        let timeout_secs: u64 = env::var("HEATMAP_TICKER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TICKER_TIMEOUT_SECS.to_string())
            .parse()
            .context("HEATMAP_TICKER_TIMEOUT_SECS must be a number of seconds")?;
        let ttl_secs: u64 = env::var("HEATMAP_CACHE_TTL_SECS")
            .unwrap_or_else(|_| CACHE_TTL_SECS.to_string())
            .parse()
            .context("HEATMAP_CACHE_TTL_SECS must be a number of seconds")?;

        Ok(Self {
            workers: clamp_workers(workers),
            ticker_timeout: Duration::from_secs(timeout_secs),
            cache_ttl: Duration::from_secs(ttl_secs),
            catalog_path: env::var("HEATMAP_CATALOG").ok().map(PathBuf::from),
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = clamp_workers(workers);
        self
    }

    pub fn with_ticker_timeout(mut self, timeout: Duration) -> Self {
        self.ticker_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

pub fn clamp_workers(workers: usize) -> usize {
    let clamped = workers.clamp(MIN_WORKERS, MAX_WORKERS);
    if clamped != workers {
        tracing::warn!(
            "Worker count {} outside {}..={}, using {}",
            workers,
            MIN_WORKERS,
            MAX_WORKERS,
            clamped
        );
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, 50);
        assert_eq!(config.ticker_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_workers_clamped() {
        assert_eq!(clamp_workers(5), 20);
        assert_eq!(clamp_workers(200), 50);
        assert_eq!(clamp_workers(32), 32);
        assert_eq!(EngineConfig::default().with_workers(1).workers, 20);
    }
}
