use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::Config;
use crate::error::ProviderError;
use crate::exchange::CandleProvider;
use crate::models::{Candle, CandleSeries, Symbol, Timeframe};

const PROVIDER: &str = "coinbase";
const MAX_CANDLES_PER_REQUEST: u64 = 300;

#[derive(Debug, Serialize)]
struct JwtClaims {
    sub: String,
    iss: String,
    nbf: u64,
    exp: u64,
    uri: String,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    start: String,
    low: String,
    high: String,
    open: String,
    close: String,
    #[serde(default)]
    volume: String,
}

/// Primary candle source: Coinbase Advanced Trade public market candles.
///
/// Requests are signed with an ES256 JWT when API credentials are configured,
/// otherwise they go out unauthenticated against the public endpoint.
pub struct CoinbaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl CoinbaseClient {
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
            base_url: cfg.coinbase_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.coinbase_api_key.clone(),
            api_secret: cfg.coinbase_api_secret.clone(),
        })
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    fn generate_jwt(&self, method: &str, path: &str) -> Result<String, ProviderError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProviderError::Auth(e.to_string()))?
            .as_secs();

        let host = self
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let uri = format!("{} {}{}", method, host, path);

        let claims = JwtClaims {
            sub: self.api_key.clone(),
            iss: "cdp".to_string(),
            nbf: now,
            exp: now + 120,
            uri,
        };

        // Secret is a PEM "EC PRIVATE KEY" block
        let key = EncodingKey::from_ec_pem(self.api_secret.as_bytes())
            .map_err(|e| ProviderError::Auth(format!("bad EC key: {}", e)))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.api_key.clone());
        header.typ = Some("JWT".to_string());

        encode(&header, &claims, &key).map_err(|e| ProviderError::Auth(e.to_string()))
    }

    async fn fetch_chunk(
        &self,
        product: &str,
        granularity: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, ProviderError> {
        let path = format!("/api/v3/brokerage/market/products/{}/candles", product);

        let mut req = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("granularity", granularity.to_string()),
                ("limit", MAX_CANDLES_PER_REQUEST.to_string()),
            ]);
        if self.has_credentials() {
            let jwt = self.generate_jwt("GET", &path)?;
            req = req.header("Authorization", format!("Bearer {}", jwt));
        }

        let resp = req.send().await.map_err(|source| ProviderError::Http {
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

        let data: CandleResponse = resp.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

        Ok(parse_candles(data))
    }
}

fn parse_candles(data: CandleResponse) -> Vec<Candle> {
    data.candles
        .into_iter()
        .filter_map(|rc| {
            let ts = rc.start.parse::<i64>().ok()?;
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            Some(Candle {
                timestamp,
                open: rc.open.parse().ok()?,
                high: rc.high.parse().ok()?,
                low: rc.low.parse().ok()?,
                close: rc.close.parse().ok()?,
                volume: rc.volume.parse().unwrap_or(0.0),
            })
        })
        .collect()
}

#[async_trait]
impl CandleProvider for CoinbaseClient {
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
        let product = Symbol::parse(symbol)
            .ok_or_else(|| ProviderError::UnknownSymbol {
                provider: PROVIDER,
                symbol: symbol.to_string(),
            })?
            .coinbase_product();

        // No native 4h granularity; fetch 1h and resample.
        let request_tf = if tf == Timeframe::H4 { Timeframe::H1 } else { tf };
        let chunk_secs = (request_tf.as_seconds() * MAX_CANDLES_PER_REQUEST) as i64;

        let start_ts = start.timestamp();
        let end_ts = end.timestamp();
        let mut chunk_start = start_ts;
        let mut all_candles = Vec::new();

        while chunk_start < end_ts {
            let chunk_end = (chunk_start + chunk_secs).min(end_ts);
            let candles = self
                .fetch_chunk(
                    &product,
                    request_tf.coinbase_granularity(),
                    chunk_start,
                    chunk_end,
                )
                .await?;
            debug!(
                "coinbase {} {} [{}..{}] -> {} candles",
                product,
                request_tf,
                chunk_start,
                chunk_end,
                candles.len()
            );
            all_candles.extend(candles);
            chunk_start = chunk_end;
        }

        // Coinbase returns newest first, we want oldest first
        let series = CandleSeries::normalized(all_candles);
        if tf == Timeframe::H4 {
            Ok(series.resample(tf.as_duration()))
        } else {
            Ok(series)
        }
    }
}
