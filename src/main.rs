use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signal_validator::config::Config;
use signal_validator::exchange::{BinanceClient, CoinbaseClient, FallbackProvider};
use signal_validator::models::TradingSignal;
use signal_validator::validation::{BatchValidator, JsonlLedger, SignalValidator};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    // signal-validator [signals.json] [out.json]
    let args: Vec<String> = std::env::args().collect();
    let input = args.get(1).cloned().unwrap_or_else(|| cfg.signals_path.clone());
    let output = args.get(2).cloned().unwrap_or_else(|| input.clone());

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read signals from {}", input))?;
    let signals: Vec<TradingSignal> =
        serde_json::from_str(&content).context("Failed to parse signals")?;

    info!(
        "Loaded {} signals from {} (interval {}, horizon {}h, batch {} / {}ms)",
        signals.len(),
        input,
        cfg.interval,
        cfg.horizon_hours,
        cfg.batch_size,
        cfg.batch_delay_ms
    );

    let primary = CoinbaseClient::new(&cfg).context("Failed to build Coinbase client")?;
    let fallback = BinanceClient::new(&cfg).context("Failed to build Binance client")?;
    let provider = FallbackProvider::new(Arc::new(primary), Arc::new(fallback));
    let ledger = JsonlLedger::open(&cfg.ledger_path).context("Failed to open ledger")?;

    let validator = Arc::new(SignalValidator::new(&cfg, provider, Arc::new(ledger)));
    let run = BatchValidator::new(&cfg, validator).run(signals).await;

    let json = serde_json::to_string_pretty(&run.signals)?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write signals to {}", output))?;
    info!("Updated signals written to {}", output);

    run.summary.print_summary();

    Ok(())
}
