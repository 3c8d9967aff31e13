use serde::{Deserialize, Serialize};

use crate::models::Outcome;

/// Counts for one orchestrator pass. `errors` is kept apart from the FALSE
/// outcome category: an errored signal was never classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Already finalized in the ledger or a repeated id, passed through untouched
    pub skipped: usize,
    pub winners: usize,
    pub partials: usize,
    pub losers: usize,
    pub false_signals: usize,
    pub pending: usize,
    pub errors: usize,
    pub batch_sizes: Vec<usize>,
    pub delays: usize,
    /// Winners + partials over all decided (non-pending) outcomes, in percent
    pub win_rate: f64,
    pub avg_profit_pct: f64,
    #[serde(skip)]
    profits: Vec<f64>,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_outcome(&mut self, outcome: Outcome, profit_pct: Option<f64>) {
        match outcome {
            Outcome::Winner => self.winners += 1,
            Outcome::Partial => self.partials += 1,
            Outcome::Loser => self.losers += 1,
            Outcome::False => self.false_signals += 1,
            Outcome::Pending => self.pending += 1,
        }
        if let Some(p) = profit_pct {
            self.profits.push(p);
        }
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn decided(&self) -> usize {
        self.winners + self.partials + self.losers + self.false_signals
    }

    pub fn finish(&mut self) {
        let decided = self.decided();
        self.win_rate = if decided == 0 {
            0.0
        } else {
            round1((self.winners + self.partials) as f64 / decided as f64 * 100.0)
        };
        self.avg_profit_pct = if self.profits.is_empty() {
            0.0
        } else {
            round2(self.profits.iter().sum::<f64>() / self.profits.len() as f64)
        };
    }

    pub fn print_summary(&self) {
        println!("Signal validation summary");
        println!("=========================");
        println!("  Signals:   {} ({} skipped: final or duplicate)", self.total, self.skipped);
        println!(
            "  Batches:   {} {:?} with {} delays",
            self.batch_sizes.len(),
            self.batch_sizes,
            self.delays
        );
        println!();
        println!("  WINNER:    {}", self.winners);
        println!("  PARTIAL:   {}", self.partials);
        println!("  LOSER:     {}", self.losers);
        println!("  FALSE:     {}", self.false_signals);
        println!("  PENDING:   {}", self.pending);
        println!("  Errored:   {}", self.errors);
        println!();
        println!("  Win rate:  {:.1}%", self.win_rate);
        println!("  Avg P/L:   {:+.2}%", self.avg_profit_pct);
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_ignores_pending_and_errors() {
        let mut s = BatchSummary::new(6);
        s.record_outcome(Outcome::Winner, Some(15.0));
        s.record_outcome(Outcome::Partial, Some(5.0));
        s.record_outcome(Outcome::Loser, Some(-5.0));
        s.record_outcome(Outcome::False, None);
        s.record_outcome(Outcome::Pending, None);
        s.record_error();
        s.finish();

        assert_eq!(s.decided(), 4);
        assert_eq!(s.errors, 1);
        assert!((s.win_rate - 50.0).abs() < 1e-9);
        assert!((s.avg_profit_pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zero() {
        let mut s = BatchSummary::new(0);
        s.finish();
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.avg_profit_pct, 0.0);
    }
}
