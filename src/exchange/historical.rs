use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ProviderError;
use crate::exchange::CandleProvider;
use crate::models::{Candle, CandleSeries, Symbol, Timeframe};

/// A provider that replays pre-loaded candles, keyed by symbol and timeframe.
/// Symbols are matched after normalisation, so `BTCUSDT` and `BTC/USDT` share data.
pub struct HistoricalProvider {
    data: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
}

impl HistoricalProvider {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    fn key(symbol: &str) -> String {
        Symbol::parse(symbol)
            .map(|s| s.to_string())
            .unwrap_or_else(|| symbol.to_ascii_uppercase())
    }

    /// Load candles for a symbol/timeframe, replacing anything loaded before.
    pub fn load(&self, symbol: &str, tf: Timeframe, candles: Vec<Candle>) {
        let series = CandleSeries::normalized(candles);
        if let Ok(mut data) = self.data.write() {
            data.insert((Self::key(symbol), tf), series.into_iter().collect());
        }
    }
}

impl Default for HistoricalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleProvider for HistoricalProvider {
    fn name(&self) -> &'static str {
        "historical"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        tf: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError> {
        let data = self.data.read().map_err(|e| ProviderError::Decode {
            provider: "historical",
            reason: e.to_string(),
        })?;
        let Some(all) = data.get(&(Self::key(symbol), tf)) else {
            return Ok(CandleSeries::default());
        };

        // Binary search the [start, end] window
        let lo = all.partition_point(|c| c.timestamp < start);
        let hi = all.partition_point(|c| c.timestamp <= end);
        if lo >= hi {
            return Ok(CandleSeries::default());
        }
        Ok(CandleSeries::new(all[lo..hi].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_candles;

    #[tokio::test]
    async fn returns_window_only() {
        let series = make_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.0),
            (101.0, 103.0, 100.5, 102.5),
        ]);
        let t0 = series[0].timestamp;
        let t1 = series[1].timestamp;
        let provider = HistoricalProvider::new();
        provider.load("BTCUSDT", Timeframe::M1, series.into_iter().collect());

        let got = provider
            .fetch_candles("btc/usdt", Timeframe::M1, t1, t1)
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].timestamp, t1);

        let got = provider
            .fetch_candles("BTCUSDT", Timeframe::M1, t0, t1)
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn unknown_symbol_is_empty() {
        let provider = HistoricalProvider::new();
        let now = Utc::now();
        let got = provider
            .fetch_candles("ETHUSDT", Timeframe::M5, now, now)
            .await
            .unwrap();
        assert!(got.is_empty());
    }
}
