use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::ProviderError;
use crate::exchange::CandleProvider;
use crate::models::{Candle, CandleSeries, Symbol, Timeframe};

const PROVIDER: &str = "binance";
const MAX_KLINES_PER_REQUEST: i64 = 1000;

/// Fallback candle source: Binance spot klines (public, unauthenticated).
///
/// Rows arrive as JSON arrays:
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(cfg: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;
        Ok(Self {
            client,
            base_url: cfg.binance_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        tf: Timeframe,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, ProviderError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", tf.binance_interval().to_string()),
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", MAX_KLINES_PER_REQUEST.to_string()),
            ])
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Vec<Value>> = resp.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

        Ok(rows.iter().filter_map(|row| parse_row(row)).collect())
    }
}

fn num(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let open_time = row[0].as_i64()?;
    Some(Candle {
        timestamp: DateTime::from_timestamp_millis(open_time)?,
        open: num(&row[1])?,
        high: num(&row[2])?,
        low: num(&row[3])?,
        close: num(&row[4])?,
        volume: num(&row[5]).unwrap_or(0.0),
    })
}

#[async_trait]
impl CandleProvider for BinanceClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        tf: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, ProviderError> {
        let pair = Symbol::parse(symbol)
            .ok_or_else(|| ProviderError::UnknownSymbol {
                provider: PROVIDER,
                symbol: symbol.to_string(),
            })?
            .binance_symbol();

        let step_ms = tf.as_seconds() as i64 * 1000;
        let end_ms = end.timestamp_millis();
        let mut cursor = start.timestamp_millis();
        let mut all_candles: Vec<Candle> = Vec::new();

        while cursor < end_ms {
            let page = self.fetch_page(&pair, tf, cursor, end_ms).await?;
            debug!("binance {} {} from {} -> {} klines", pair, tf, cursor, page.len());
            let Some(last) = page.last() else {
                break;
            };
            let next = last.timestamp.timestamp_millis() + step_ms;
            let full_page = page.len() as i64 >= MAX_KLINES_PER_REQUEST;
            all_candles.extend(page);
            if !full_page || next <= cursor {
                break;
            }
            cursor = next;
        }

        Ok(CandleSeries::normalized(all_candles))
    }
}
