pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Interval, Period, PriceSeries};

/// Supplier of OHLCV history for one instrument. Implementations return a
/// validated series or `SignalError::DataFetch`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, symbol: &str, period: Period, interval: Interval) -> Result<PriceSeries>;

    fn name(&self) -> &str;
}
