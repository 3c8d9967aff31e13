use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::profit::result_profit_pct;
use crate::core::{PricePathEvaluator, ValidationResult};
use crate::error::ValidationError;
use crate::exchange::FallbackProvider;
use crate::models::{Outcome, SignalStatus, Timeframe, TradingSignal, ValidationKind};
use crate::validation::ledger::{Ledger, ValidationRecord};
use crate::validation::policy::{Permit, RevalidationPolicy};

/// Validates one signal end to end: ledger gate, candle fetch, evaluation,
/// revalidation rules, profit, ledger append.
pub struct SignalValidator {
    provider: FallbackProvider,
    ledger: Arc<dyn Ledger>,
    evaluator: PricePathEvaluator,
    timeframe: Timeframe,
    /// When set, used instead of Utc::now() (replays and tests)
    sim_time: Option<DateTime<Utc>>,
}

impl SignalValidator {
    pub fn new(cfg: &Config, provider: FallbackProvider, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            provider,
            ledger,
            evaluator: PricePathEvaluator::new(cfg.horizon()),
            timeframe: cfg.interval,
            sim_time: None,
        }
    }

    pub fn with_time(mut self, now: DateTime<Utc>) -> Self {
        self.sim_time = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    /// Whether the ledger forbids any further validation of `signal_id`.
    pub async fn is_finalized(&self, signal_id: &str) -> Result<bool, ValidationError> {
        let records = self.ledger.query_by_signal_id(signal_id).await?;
        Ok(RevalidationPolicy::is_finalized(&records))
    }

    pub async fn can_revalidate(&self, signal_id: &str) -> Result<bool, ValidationError> {
        let records = self.ledger.query_by_signal_id(signal_id).await?;
        Ok(RevalidationPolicy::can_revalidate(&records))
    }

    /// Validate a single signal and return its updated copy.
    ///
    /// Fails with `PolicyViolation` for signals the ledger has finalized. Data
    /// and shape errors leave the ledger untouched.
    pub async fn validate(&self, signal: &TradingSignal) -> Result<TradingSignal, ValidationError> {
        let records = self.ledger.query_by_signal_id(&signal.id).await?;
        let permit = RevalidationPolicy::permit(&signal.id, &records)?;

        signal
            .checked_stop_loss()
            .map_err(|reason| ValidationError::MalformedSignal {
                signal_id: signal.id.clone(),
                reason,
            })?;

        let now = self.now();
        let end = now.min(self.evaluator.window_end(signal));
        if end <= signal.created_at {
            return Err(ValidationError::DataUnavailable {
                symbol: signal.symbol.clone(),
                reason: format!(
                    "evaluation window has not started (created {})",
                    signal.created_at.to_rfc3339()
                ),
            });
        }

        debug!(
            "{} {} {}: fetching {} candles {} -> {}",
            signal.id,
            signal.symbol,
            permit.kind,
            self.timeframe,
            signal.created_at.to_rfc3339(),
            end.to_rfc3339()
        );
        let candles = self
            .provider
            .fetch(&signal.symbol, self.timeframe, signal.created_at, end)
            .await?;

        let fresh = self.evaluator.evaluate(signal, &candles, now)?;
        let result = permit.resolve(fresh);
        let updated = apply(signal, &permit, &result, now);

        self.ledger
            .append(ValidationRecord {
                signal_id: signal.id.clone(),
                validated_at: now,
                previous_result: permit.previous,
                new_result: result.outcome,
                kind: permit.kind,
                hit_levels: result.hit_levels.clone(),
                extreme_price: result.extreme_price,
                profit_pct: updated.profit_pct,
            })
            .await?;

        info!(
            "{} {} {} -> {} ({}) profit={}",
            signal.id,
            signal.symbol,
            permit.kind,
            result.outcome,
            result.explanation,
            updated
                .profit_pct
                .map(|p| format!("{:+.2}%", p))
                .unwrap_or_else(|| "-".to_string())
        );

        Ok(updated)
    }
}

/// Copy `signal` with the decision written into its result fields.
fn apply(
    signal: &TradingSignal,
    permit: &Permit,
    result: &ValidationResult,
    now: DateTime<Utc>,
) -> TradingSignal {
    let mut updated = signal.clone();

    for target in updated.targets.iter_mut() {
        target.hit = result.hit_levels.contains(&target.level);
    }

    updated.status = match result.outcome {
        Outcome::Pending => SignalStatus::Active,
        Outcome::Partial if permit.kind == ValidationKind::Initial => SignalStatus::Waiting,
        _ => SignalStatus::Completed,
    };
    updated.completed_at = match updated.status {
        SignalStatus::Completed => result.decided_at.or(Some(now)),
        _ => None,
    };
    updated.result = Some(result.outcome);
    updated.profit_pct = result_profit_pct(signal, result);
    updated.verified_at = Some(now);
    updated.validation_details = Some(result.explanation.clone());
    updated.error = None;
    updated
}
