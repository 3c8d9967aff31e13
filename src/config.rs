use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::Timeframe;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Market data
    pub interval: Timeframe,
    pub coinbase_base_url: String,
    pub coinbase_api_key: String,
    pub coinbase_api_secret: String,
    pub binance_base_url: String,
    pub request_timeout_secs: u64,

    // Evaluation
    pub horizon_hours: i64,

    // Batching
    pub batch_size: usize,
    pub batch_delay_ms: u64,

    // Storage
    pub ledger_path: String,
    pub signals_path: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Config {
            interval: Timeframe::from_str_loose(&env("CANDLE_INTERVAL", "5m"))
                .unwrap_or(Timeframe::M5),
            coinbase_base_url: env("COINBASE_BASE_URL", "https://api.coinbase.com"),
            coinbase_api_key: env("COINBASE_API_KEY", ""),
            coinbase_api_secret: env("COINBASE_API_SECRET", "").replace("\\n", "\n"),
            binance_base_url: env("BINANCE_BASE_URL", "https://api.binance.com"),
            request_timeout_secs: env("REQUEST_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            horizon_hours: env("HORIZON_HOURS", "24").parse().unwrap_or(24),
            batch_size: env("BATCH_SIZE", "3").parse::<usize>().unwrap_or(3).max(1),
            batch_delay_ms: env("BATCH_DELAY_MS", "1000").parse().unwrap_or(1000),
            ledger_path: env("LEDGER_PATH", "data/validation_ledger.jsonl"),
            signals_path: env("SIGNALS_PATH", "data/signals.json"),
            log_level: env("LOG_LEVEL", "info"),
        }
    }

    pub fn horizon(&self) -> ChronoDuration {
        ChronoDuration::hours(self.horizon_hours.max(1))
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
