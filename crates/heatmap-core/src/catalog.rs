//! Ticker catalog: sector name to an ordered list of ticker symbols.
//!
//! Loaded once at startup (built-in lists or a TOML file) and shared
//! read-only afterwards. Sector order is preserved as written.
//!
//! ```toml
//! [[sectors]]
//! name = "Technology"
//! tickers = ["AAPL", "MSFT"]
//! ```

use crate::HeatmapError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerCatalog {
    sectors: Vec<Sector>,
}

impl TickerCatalog {
    /// Build a catalog, normalizing symbols to upper case.
    ///
    /// Rejects empty or duplicate sector names and empty symbols. A symbol
    /// listed twice in one sector is kept once.
    pub fn new(sectors: Vec<Sector>) -> Result<Self, HeatmapError> {
        let mut seen_names = HashSet::new();
        let mut normalized = Vec::with_capacity(sectors.len());

        for sector in sectors {
            let name = sector.name.trim().to_string();
            if name.is_empty() {
                return Err(HeatmapError::InvalidCatalog("sector with empty name".into()));
            }
            if !seen_names.insert(name.clone()) {
                return Err(HeatmapError::InvalidCatalog(format!("duplicate sector '{name}'")));
            }

            let mut seen_tickers = HashSet::new();
            let mut tickers = Vec::with_capacity(sector.tickers.len());
            for raw in sector.tickers {
                let ticker = raw.trim().to_uppercase();
                if ticker.is_empty() {
                    return Err(HeatmapError::InvalidCatalog(format!(
                        "empty ticker in sector '{name}'"
                    )));
                }
                if seen_tickers.insert(ticker.clone()) {
                    tickers.push(ticker);
                }
            }

            normalized.push(Sector { name, tickers });
        }

        Ok(Self {
            sectors: normalized,
        })
    }

    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, HeatmapError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HeatmapError::InvalidCatalog(format!("read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, HeatmapError> {
        let parsed: TickerCatalog = toml::from_str(content)
            .map_err(|e| HeatmapError::InvalidCatalog(format!("parse catalog TOML: {e}")))?;
        Self::new(parsed.sectors)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sector_tickers(&self, name: &str) -> Option<&[String]> {
        self.sectors
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.tickers.as_slice())
    }

    /// Every distinct ticker, in catalog order.
    pub fn all_tickers(&self) -> Vec<String> {
        let listed: Vec<String> = self
            .sectors
            .iter()
            .flat_map(|s| s.tickers.iter().cloned())
            .collect();
        dedup_tickers(&listed)
    }

    pub fn ticker_count(&self) -> usize {
        self.all_tickers().len()
    }

    fn from_static(data: &[(&str, &[&str])]) -> Self {
        Self {
            sectors: data
                .iter()
                .map(|(name, tickers)| Sector {
                    name: name.to_string(),
                    tickers: tickers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        }
    }

    /// S&P 500 constituents grouped into 11 sectors.
    pub fn default_sp500() -> Self {
        Self::from_static(&[
            (
                "Technology",
                &[
                    "AAPL", "MSFT", "NVDA", "AVGO", "ORCL", "CRM", "ADBE", "AMD", "INTC", "CSCO",
                    "IBM", "QCOM", "TXN", "NOW", "INTU", "AMAT", "MU", "LRCX", "KLAC", "SNPS",
                    "CDNS", "ADSK", "ADI", "FTNT", "PANW", "ANSS", "MPWR", "KEYS", "NXPI", "MCHP",
                    "ON", "FSLR", "HPQ", "HPE", "WDC", "STX", "NTAP", "JNPR", "AKAM", "ZBRA",
                    "EPAM", "IT", "CTSH", "GDDY", "GEN", "FFIV", "SWKS", "QRVO", "TER", "ENPH",
                ],
            ),
            (
                "Communication",
                &[
                    "GOOGL", "GOOG", "META", "NFLX", "DIS", "CMCSA", "VZ", "T", "TMUS", "CHTR",
                    "EA", "WBD", "PARA", "FOXA", "FOX", "OMC", "IPG", "TTWO", "LYV", "MTCH",
                    "NWS", "NWSA", "DISH",
                ],
            ),
            (
                "Consumer Cyclical",
                &[
                    "AMZN", "TSLA", "HD", "MCD", "NKE", "SBUX", "LOW", "TJX", "BKNG", "CMG",
                    "ORLY", "AZO", "ROST", "MAR", "HLT", "DHI", "LEN", "PHM", "NVR", "GM",
                    "F", "APTV", "EBAY", "ETSY", "DPZ", "YUM", "DARDEN", "POOL", "BBY", "ULTA",
                    "LVS", "WYNN", "MGM", "CZR", "RCL", "CCL", "NCLH", "EXPE", "GRMN", "BWA",
                    "RL", "TPR", "PVH", "VFC", "HAS", "LEG", "MHK", "WHR",
                ],
            ),
            (
                "Financial",
                &[
                    "BRK-B", "JPM", "V", "MA", "BAC", "WFC", "GS", "MS", "AXP", "BLK",
                    "C", "SCHW", "CB", "PGR", "MMC", "ICE", "CME", "AON", "MET", "AIG",
                    "TRV", "PNC", "USB", "TFC", "AMP", "SPGI", "MCO", "MSCI", "FIS", "FISV",
                    "COF", "BK", "STT", "NTRS", "FITB", "KEY", "RF", "CFG", "HBAN", "ZION",
                    "MTB", "CINF", "L", "ALL", "AFL", "PRU", "LNC", "GL", "AIZ", "BRO",
                    "WRB", "RE", "HIG", "CNA", "ALLY", "SYF", "DFS", "NDAQ", "CBOE", "IVZ",
                ],
            ),
            (
                "Healthcare",
                &[
                    "UNH", "LLY", "JNJ", "ABBV", "MRK", "PFE", "TMO", "ABT", "DHR", "BMY",
                    "AMGN", "MDT", "CVS", "ELV", "ISRG", "GILD", "VRTX", "SYK", "HCA", "CI",
                    "ZTS", "BDX", "BSX", "REGN", "MCK", "COR", "EW", "IQV", "IDXX", "HUM",
                    "DXCM", "A", "MTD", "BAX", "WST", "CAH", "RMD", "HOLX", "TFX", "DGX",
                    "VTRS", "MOH", "CNC", "ALGN", "COO", "TECH", "LH", "PKI", "BIO", "HSIC",
                    "XRAY", "CTLT", "OGN", "INCY", "BIIB",
                ],
            ),
            (
                "Industrials",
                &[
                    "GE", "CAT", "RTX", "HON", "UNP", "BA", "UPS", "DE", "LMT", "MMM",
                    "ETN", "ADP", "ITW", "WM", "EMR", "GD", "CSX", "NSC", "PH", "TT",
                    "NOC", "CTAS", "JCI", "PCAR", "CARR", "OTIS", "ROK", "CMI", "FDX", "TDG",
                    "FAST", "AME", "LHX", "GWW", "VRSK", "IR", "PWR", "XYL", "DOV", "WAB",
                    "SWK", "IEX", "HUBB", "CSGP", "LDOS", "J", "BAH", "CPRT", "EXPD", "UAL",
                    "DAL", "LUV", "ALK", "AAL", "CHRW", "JBHT", "ODFL", "GNRC", "MAS", "ALLE",
                ],
            ),
            (
                "Consumer Defensive",
                &[
                    "PG", "KO", "PEP", "COST", "WMT", "PM", "MO", "CL", "MDLZ", "KHC",
                    "EL", "STZ", "GIS", "SYY", "KMB", "K", "HSY", "KR", "CLX", "TAP",
                    "TSN", "CAG", "ADM", "BG", "SJM", "MKC", "CPB", "HRL", "CHD", "WBA",
                    "DG", "DLTR", "TGT",
                ],
            ),
            (
                "Energy",
                &[
                    "XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO", "OXY", "HAL",
                    "DVN", "PXD", "HES", "WMB", "KMI", "OKE", "FANG", "BKR", "TRGP", "CTRA",
                    "MRO", "APA", "EQT",
                ],
            ),
            (
                "Real Estate",
                &[
                    "PLD", "AMT", "EQIX", "CCI", "PSA", "SPG", "WELL", "DLR", "O", "AVB",
                    "EQR", "ARE", "ESS", "MAA", "UDR", "VTR", "WY", "SBAC", "EXR", "INVH",
                    "VICI", "IRM", "KIM", "REG", "CPT", "HST", "BXP", "PEAK", "SLG", "FRT",
                ],
            ),
            (
                "Utilities",
                &[
                    "NEE", "DUK", "SO", "D", "AEP", "SRE", "EXC", "XEL", "WEC", "ES",
                    "ED", "AWK", "EIX", "DTE", "ETR", "FE", "PCG", "AEE", "LNT", "CMS",
                    "CNP", "NI", "PNW", "ATO", "EVRG", "NRG", "PPL",
                ],
            ),
            (
                "Materials",
                &[
                    "LIN", "APD", "SHW", "FCX", "NEM", "ECL", "DD", "NUE", "DOW", "CTVA",
                    "VMC", "MLM", "PPG", "ALB", "IFF", "CE", "CF", "MOS", "FMC", "EMN",
                    "AVY", "IP", "PKG", "SEE", "WRK", "BALL", "AMCR",
                ],
            ),
        ])
    }

    /// Roughly the top 100 names by market cap, same sectors.
    pub fn top100() -> Self {
        Self::from_static(&[
            (
                "Technology",
                &[
                    "AAPL", "MSFT", "NVDA", "AVGO", "ORCL", "CRM", "ADBE", "AMD", "INTC", "CSCO",
                ],
            ),
            (
                "Communication",
                &[
                    "GOOGL", "META", "NFLX", "DIS", "CMCSA", "VZ", "T", "TMUS",
                ],
            ),
            (
                "Consumer Cyclical",
                &[
                    "AMZN", "TSLA", "HD", "MCD", "NKE", "SBUX", "LOW", "TJX", "BKNG",
                ],
            ),
            (
                "Financial",
                &[
                    "BRK-B", "JPM", "V", "MA", "BAC", "WFC", "GS", "MS", "AXP", "BLK",
                ],
            ),
            (
                "Healthcare",
                &[
                    "UNH", "LLY", "JNJ", "ABBV", "MRK", "PFE", "TMO", "ABT", "CVS", "ISRG",
                ],
            ),
            (
                "Industrials",
                &[
                    "GE", "CAT", "RTX", "HON", "UNP", "BA", "UPS", "DE", "LMT",
                ],
            ),
            (
                "Consumer Defensive",
                &[
                    "PG", "KO", "PEP", "COST", "WMT", "PM", "CL", "MDLZ",
                ],
            ),
            (
                "Energy",
                &[
                    "XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO",
                ],
            ),
            (
                "Real Estate",
                &[
                    "PLD", "AMT", "EQIX", "CCI", "PSA", "SPG",
                ],
            ),
            (
                "Utilities",
                &[
                    "NEE", "DUK", "SO", "D", "AEP", "SRE",
                ],
            ),
            (
                "Materials",
                &[
                    "LIN", "APD", "SHW", "FCX", "NEM", "ECL",
                ],
            ),
        ])
    }
}

/// Drop repeated tickers, keeping the first occurrence.
pub fn dedup_tickers(tickers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector(name: &str, tickers: &[&str]) -> Sector {
        Sector {
            name: name.to_string(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_catalog_has_eleven_sectors() {
        let catalog = TickerCatalog::default_sp500();
        assert_eq!(catalog.sectors().len(), 11);
        assert_eq!(catalog.sector_names()[0], "Technology");
        assert!(catalog.ticker_count() > 400);
        assert!(catalog.all_tickers().contains(&"BRK-B".to_string()));
    }

    #[test]
    fn test_top100_is_smaller() {
        let catalog = TickerCatalog::top100();
        assert_eq!(catalog.sectors().len(), 11);
        assert!(catalog.ticker_count() < 100);
        assert_eq!(
            catalog.sector_tickers("Materials").unwrap(),
            &["LIN", "APD", "SHW", "FCX", "NEM", "ECL"]
        );
    }

    #[test]
    fn test_new_normalizes_and_dedups() {
        let catalog = TickerCatalog::new(vec![sector(" Tech ", &["aapl", "AAPL", " msft"])]).unwrap();
        assert_eq!(catalog.sector_names(), vec!["Tech"]);
        assert_eq!(catalog.sector_tickers("Tech").unwrap(), &["AAPL", "MSFT"]);
    }

    #[test]
    fn test_duplicate_sector_rejected() {
        let err = TickerCatalog::new(vec![sector("Tech", &["A"]), sector("Tech", &["B"])]).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidCatalog(_)));
    }

    #[test]
    fn test_empty_ticker_rejected() {
        assert!(TickerCatalog::new(vec![sector("Tech", &["A", "  "])]).is_err());
    }

    #[test]
    fn test_all_tickers_dedups_across_sectors() {
        let catalog = TickerCatalog::new(vec![
            sector("Tech", &["X", "Y"]),
            sector("Growth", &["Y", "Z"]),
        ])
        .unwrap();
        assert_eq!(catalog.all_tickers(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_toml_preserves_order() {
        let content = r#"
            [[sectors]]
            name = "Utilities"
            tickers = ["NEE", "DUK"]

            [[sectors]]
            name = "Energy"
            tickers = ["XOM"]
        "#;
        let catalog = TickerCatalog::from_toml(content).unwrap();
        assert_eq!(catalog.sector_names(), vec!["Utilities", "Energy"]);
        assert_eq!(catalog.sector_tickers("Utilities").unwrap(), &["NEE", "DUK"]);
    }

    #[test]
    fn test_dedup_tickers_keeps_first_occurrence() {
        let tickers: Vec<String> = ["B", "A", "B", "C", "A"].iter().map(|t| t.to_string()).collect();
        assert_eq!(dedup_tickers(&tickers), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_bad_toml() {
        assert!(TickerCatalog::from_toml("sectors = 3").is_err());
    }
}
