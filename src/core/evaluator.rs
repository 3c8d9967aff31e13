use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{CandleSeries, Direction, Outcome, TradingSignal};

/// What a walk over the price path concluded. Transient; the validator turns it
/// into signal fields and a ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub outcome: Outcome,
    /// Target levels confirmed before the walk stopped, ascending.
    pub hit_levels: Vec<u32>,
    /// Most favourable price seen: highest high for LONG, lowest low for SHORT.
    pub extreme_price: Option<f64>,
    /// Timestamp of the candle that decided the outcome, if one did.
    pub decided_at: Option<DateTime<Utc>>,
    pub explanation: String,
}

impl ValidationResult {
    pub fn highest_hit(&self) -> Option<u32> {
        self.hit_levels.iter().copied().max()
    }
}

/// Walks candles forward from signal creation and classifies the signal.
///
/// Same-candle ambiguity is resolved in favour of the stop: a target touched in
/// the same candle as the stop does not count. Targets confirmed in strictly
/// earlier candles turn a stop-out into PARTIAL instead of LOSER.
#[derive(Debug, Clone, Copy)]
pub struct PricePathEvaluator {
    horizon: Duration,
}

impl PricePathEvaluator {
    pub fn new(horizon: Duration) -> Self {
        Self { horizon }
    }

    /// End of the evaluation window for a signal.
    pub fn window_end(&self, signal: &TradingSignal) -> DateTime<Utc> {
        signal.created_at + self.horizon
    }

    pub fn evaluate(
        &self,
        signal: &TradingSignal,
        candles: &CandleSeries,
        now: DateTime<Utc>,
    ) -> Result<ValidationResult, ValidationError> {
        let stop = signal
            .checked_stop_loss()
            .map_err(|reason| ValidationError::MalformedSignal {
                signal_id: signal.id.clone(),
                reason,
            })?;

        let path = candles
            .since(signal.created_at)
            .until(self.window_end(signal));
        if path.is_empty() {
            return Err(ValidationError::DataUnavailable {
                symbol: signal.symbol.clone(),
                reason: format!(
                    "no candles between {} and {}",
                    signal.created_at.to_rfc3339(),
                    self.window_end(signal).to_rfc3339()
                ),
            });
        }

        let mut hits: Vec<u32> = Vec::new();
        let mut extreme: Option<f64> = None;

        for candle in path.iter() {
            let (favourable, stop_touched) = match signal.direction {
                Direction::Long => (candle.high, candle.low <= stop),
                Direction::Short => (candle.low, candle.high >= stop),
            };
            extreme = Some(match (extreme, signal.direction) {
                (None, _) => favourable,
                (Some(x), Direction::Long) => x.max(favourable),
                (Some(x), Direction::Short) => x.min(favourable),
            });

            let fresh: Vec<u32> = signal
                .targets
                .iter()
                .filter(|t| !hits.contains(&t.level))
                .filter(|t| match signal.direction {
                    Direction::Long => candle.high >= t.price,
                    Direction::Short => candle.low <= t.price,
                })
                .map(|t| t.level)
                .collect();

            if stop_touched {
                let same_bar = if fresh.is_empty() {
                    String::new()
                } else {
                    format!(
                        "; {} touched in the same candle, stop takes precedence",
                        format_levels(&fresh)
                    )
                };
                let (outcome, explanation) = if hits.is_empty() {
                    (
                        Outcome::Loser,
                        format!(
                            "stop-loss {} hit at {} before any target{}",
                            stop,
                            candle.timestamp.to_rfc3339(),
                            same_bar
                        ),
                    )
                } else {
                    (
                        Outcome::Partial,
                        format!(
                            "{} confirmed before stop-loss {} hit at {}{}",
                            format_levels(&hits),
                            stop,
                            candle.timestamp.to_rfc3339(),
                            same_bar
                        ),
                    )
                };
                return Ok(ValidationResult {
                    outcome,
                    hit_levels: hits,
                    extreme_price: extreme,
                    decided_at: Some(candle.timestamp),
                    explanation,
                });
            }

            hits.extend(fresh);
            hits.sort_unstable();

            if hits.len() == signal.targets.len() {
                return Ok(ValidationResult {
                    outcome: Outcome::Winner,
                    explanation: format!(
                        "all {} targets hit by {} without touching stop-loss {}",
                        hits.len(),
                        candle.timestamp.to_rfc3339(),
                        stop
                    ),
                    hit_levels: hits,
                    extreme_price: extreme,
                    decided_at: Some(candle.timestamp),
                });
            }
        }

        let last_ts = path.last().map(|c| c.timestamp);
        if !hits.is_empty() {
            return Ok(ValidationResult {
                outcome: Outcome::Partial,
                explanation: format!(
                    "{} of {} targets hit ({}), stop-loss untouched",
                    hits.len(),
                    signal.targets.len(),
                    format_levels(&hits)
                ),
                hit_levels: hits,
                extreme_price: extreme,
                decided_at: last_ts,
            });
        }

        let elapsed = now - signal.created_at;
        if elapsed > self.horizon {
            Ok(ValidationResult {
                outcome: Outcome::False,
                hit_levels: hits,
                extreme_price: extreme,
                decided_at: None,
                explanation: format!(
                    "no target or stop-loss touched within {}h",
                    self.horizon.num_hours()
                ),
            })
        } else {
            Ok(ValidationResult {
                outcome: Outcome::Pending,
                hit_levels: hits,
                extreme_price: extreme,
                decided_at: None,
                explanation: format!(
                    "untouched after {}m of {}h window",
                    elapsed.num_minutes(),
                    self.horizon.num_hours()
                ),
            })
        }
    }
}

fn format_levels(levels: &[u32]) -> String {
    levels
        .iter()
        .map(|l| format!("TP{}", l))
        .collect::<Vec<_>>()
        .join(",")
}
