use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::error::ProviderError;
use crate::exchange::CandleProvider;
use crate::models::{
    Candle, CandleSeries, Direction, SignalStatus, Target, Timeframe, TradingSignal,
};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing 1m timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    make_candles_every(Duration::minutes(1), data)
}

/// Same as [`make_candles`] with a custom spacing.
pub fn make_candles_every(step: Duration, data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = base_time();
    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + step * i as i32,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

fn targets(prices: &[f64]) -> Vec<Target> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| Target {
            level: i as u32 + 1,
            price,
            hit: false,
        })
        .collect()
}

/// LONG BTCUSDT, entry 100, stop 95, targets 105/110/115, created at `base_time()`.
pub fn long_signal() -> TradingSignal {
    TradingSignal {
        id: "sig-long".to_string(),
        symbol: "BTCUSDT".to_string(),
        direction: Direction::Long,
        entry_price: 100.0,
        stop_loss: Some(95.0),
        targets: targets(&[105.0, 110.0, 115.0]),
        leverage: 1.0,
        created_at: base_time(),
        status: SignalStatus::Active,
        completed_at: None,
        profit_pct: None,
        result: None,
        verified_at: None,
        validation_details: None,
        error: None,
    }
}

/// SHORT BTCUSDT, entry 100, stop 105, targets 95/90/85, created at `base_time()`.
pub fn short_signal() -> TradingSignal {
    TradingSignal {
        id: "sig-short".to_string(),
        direction: Direction::Short,
        stop_loss: Some(105.0),
        targets: targets(&[95.0, 90.0, 85.0]),
        ..long_signal()
    }
}

/// A provider whose every request fails.
#[derive(Debug, Default)]
pub struct FailingProvider;

#[async_trait]
impl CandleProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch_candles(
        &self,
        _symbol: &str,
        _tf: Timeframe,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError> {
        Err(ProviderError::Status {
            provider: "failing",
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// A Config suitable for testing: 1m candles, no batch delay, temp ledger.
pub fn default_test_config() -> Config {
    Config {
        interval: Timeframe::M1,
        coinbase_base_url: "http://127.0.0.1:9".to_string(),
        coinbase_api_key: String::new(),
        coinbase_api_secret: String::new(),
        binance_base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 1,
        horizon_hours: 24,
        batch_size: 3,
        batch_delay_ms: 0,
        ledger_path: std::env::temp_dir()
            .join("signal_validator_test/ledger.jsonl")
            .to_string_lossy()
            .to_string(),
        signals_path: String::new(),
        log_level: "ERROR".to_string(),
    }
}
