use crate::core::ValidationResult;
use crate::models::{Direction, Outcome, TradingSignal};

/// Direction-adjusted percentage move from `entry` to `exit_ref`.
///
/// LONG: `(exit / entry - 1) * 100`, SHORT: `(entry / exit - 1) * 100`.
pub fn profit_pct(direction: Direction, entry: f64, exit_ref: f64) -> f64 {
    match direction {
        Direction::Long => (exit_ref / entry - 1.0) * 100.0,
        Direction::Short => (entry / exit_ref - 1.0) * 100.0,
    }
}

/// [`profit_pct`] scaled linearly by leverage and rounded to cents of a percent.
/// A non-positive or non-finite leverage counts as 1x.
pub fn leveraged_profit_pct(direction: Direction, entry: f64, exit_ref: f64, leverage: f64) -> f64 {
    let leverage = if leverage.is_finite() && leverage > 0.0 {
        leverage
    } else {
        1.0
    };
    round2(profit_pct(direction, entry, exit_ref) * leverage)
}

/// Profit carried by an evaluated signal. WINNER and PARTIAL exit at the
/// highest confirmed target, LOSER at the stop. PENDING and FALSE carry none.
pub fn result_profit_pct(signal: &TradingSignal, result: &ValidationResult) -> Option<f64> {
    let exit_ref = match result.outcome {
        Outcome::Winner | Outcome::Partial => {
            signal.target(result.highest_hit()?).map(|t| t.price)?
        }
        Outcome::Loser => signal.stop_loss?,
        Outcome::Pending | Outcome::False => return None,
    };
    Some(leveraged_profit_pct(
        signal.direction,
        signal.entry_price,
        exit_ref,
        signal.leverage,
    ))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
