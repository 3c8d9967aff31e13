#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use signal_validator::config::Config;
use signal_validator::error::ProviderError;
use signal_validator::exchange::{CandleProvider, FallbackProvider, HistoricalProvider};
use signal_validator::models::{
    Candle, CandleSeries, Direction, SignalStatus, Target, Timeframe, TradingSignal,
};
use signal_validator::validation::{InMemoryLedger, SignalValidator};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-17T07:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples, `step` apart from `base_time()`.
pub fn make_candles(step: Duration, data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    data.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base_time() + step * i as i32,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect()
}

pub fn signal(
    id: &str,
    symbol: &str,
    direction: Direction,
    entry: f64,
    stop: f64,
    tps: &[f64],
) -> TradingSignal {
    TradingSignal {
        id: id.to_string(),
        symbol: symbol.to_string(),
        direction,
        entry_price: entry,
        stop_loss: Some(stop),
        targets: tps
            .iter()
            .enumerate()
            .map(|(i, &price)| Target {
                level: i as u32 + 1,
                price,
                hit: false,
            })
            .collect(),
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

pub fn long_signal(id: &str, symbol: &str) -> TradingSignal {
    signal(id, symbol, Direction::Long, 100.0, 95.0, &[105.0, 110.0, 115.0])
}

pub fn short_signal(id: &str, symbol: &str) -> TradingSignal {
    signal(id, symbol, Direction::Short, 100.0, 105.0, &[95.0, 90.0, 85.0])
}

pub fn test_config() -> Config {
    let mut cfg = Config::from_env();
    cfg.interval = Timeframe::M1;
    cfg.horizon_hours = 24;
    cfg.batch_size = 3;
    cfg.batch_delay_ms = 0;
    cfg.coinbase_api_key = String::new();
    cfg.coinbase_api_secret = String::new();
    cfg.log_level = "ERROR".to_string();
    cfg
}

/// Always fails, like an upstream outage.
pub struct DownProvider;

#[async_trait]
impl CandleProvider for DownProvider {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn fetch_candles(
        &self,
        _symbol: &str,
        _tf: Timeframe,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError> {
        Err(ProviderError::Status {
            provider: "down",
            status: 502,
            body: "bad gateway".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub symbol: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Wraps a historical provider with latency, forced failures, and bookkeeping
/// of concurrent calls.
pub struct RecordingProvider {
    pub inner: HistoricalProvider,
    latency: std::time::Duration,
    fail_symbols: Vec<String>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingProvider {
    pub fn new(latency: std::time::Duration, fail_symbols: &[&str]) -> Self {
        Self {
            inner: HistoricalProvider::new(),
            latency,
            fail_symbols: fail_symbols.iter().map(|s| s.to_string()).collect(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        tf: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError> {
        let started = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call {
            symbol: symbol.to_string(),
            started,
            finished: Instant::now(),
        });

        if self.fail_symbols.iter().any(|s| s == symbol) {
            return Err(ProviderError::Status {
                provider: "recording",
                status: 500,
                body: "forced failure".to_string(),
            });
        }
        self.inner.fetch_candles(symbol, tf, start, end).await
    }
}

/// Validator over a historical primary (behind a dead fallback), shared ledger,
/// clock pinned at `now`.
pub fn historical_validator(
    hist: Arc<HistoricalProvider>,
    ledger: Arc<InMemoryLedger>,
    now: DateTime<Utc>,
) -> SignalValidator {
    let cfg = test_config();
    let provider = FallbackProvider::new(hist, Arc::new(DownProvider));
    SignalValidator::new(&cfg, provider, ledger).with_time(now)
}
