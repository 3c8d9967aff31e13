pub mod binance;
pub mod coinbase;
pub mod fallback;
pub mod historical;

pub use binance::BinanceClient;
pub use coinbase::CoinbaseClient;
pub use fallback::FallbackProvider;
pub use historical::HistoricalProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::models::{CandleSeries, Timeframe};

/// An upstream OHLC source. Implementations return candles oldest first with
/// duplicate timestamps removed; an empty series means "no data", not failure.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_candles(
        &self,
        symbol: &str,
        tf: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError>;
}
