pub mod aggregator;
pub mod catalog;
pub mod change;
pub mod error;
pub mod period;
pub mod traits;
pub mod types;

pub use aggregator::aggregate;
pub use catalog::{dedup_tickers, Sector, TickerCatalog};
pub use change::{compute_change, percent_change, round_ratio, PriceChange};
pub use error::*;
pub use period::{Lookback, Period};
pub use traits::*;
pub use types::*;
