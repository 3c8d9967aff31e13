use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::exchange::CandleProvider;
use crate::models::{CandleSeries, Timeframe};

/// Primary source with a secondary behind it.
///
/// The secondary is consulted when the primary errors or returns nothing. When
/// neither yields candles the result is [`ValidationError::DataUnavailable`].
#[derive(Clone)]
pub struct FallbackProvider {
    primary: Arc<dyn CandleProvider>,
    secondary: Arc<dyn CandleProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn CandleProvider>, secondary: Arc<dyn CandleProvider>) -> Self {
        Self { primary, secondary }
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        tf: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, ValidationError> {
        let primary_note = match self.primary.fetch_candles(symbol, tf, start, end).await {
            Ok(series) if !series.is_empty() => {
                debug!("{} served {} candles for {}", self.primary.name(), series.len(), symbol);
                return Ok(series);
            }
            Ok(_) => format!("{} returned no candles", self.primary.name()),
            Err(e) => {
                warn!("{} failed for {}: {}", self.primary.name(), symbol, e);
                e.to_string()
            }
        };

        match self.secondary.fetch_candles(symbol, tf, start, end).await {
            Ok(series) if !series.is_empty() => {
                debug!(
                    "{} (fallback) served {} candles for {}",
                    self.secondary.name(),
                    series.len(),
                    symbol
                );
                Ok(series)
            }
            Ok(_) => Err(ValidationError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!(
                    "{}; {} returned no candles",
                    primary_note,
                    self.secondary.name()
                ),
            }),
            Err(e) => {
                warn!("{} (fallback) failed for {}: {}", self.secondary.name(), symbol, e);
                Err(ValidationError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("{}; {}", primary_note, e),
                })
            }
        }
    }
}
