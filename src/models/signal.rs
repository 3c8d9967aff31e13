use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Direction, Outcome, SignalStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub level: u32,
    pub price: f64,
    #[serde(default)]
    pub hit: bool,
}

/// A previously issued trade idea. Entry, stop and target prices are never
/// modified by validation; only the result fields below `status` are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: SignalStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profit_pct: Option<f64>,
    #[serde(default)]
    pub result: Option<Outcome>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validation_details: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_leverage() -> f64 {
    1.0
}

fn default_status() -> SignalStatus {
    SignalStatus::Active
}

impl TradingSignal {
    /// Verify the price ladder before any evaluation and return the stop-loss.
    ///
    /// LONG requires `stop < entry < t1 < t2 < ...`, SHORT the mirror image.
    /// Targets must be listed in ascending level order.
    pub fn checked_stop_loss(&self) -> Result<f64, String> {
        let stop_loss = self.stop_loss.ok_or("missing stop-loss price")?;
        if self.targets.is_empty() {
            return Err("no take-profit targets".to_string());
        }

        let prices = std::iter::once(self.entry_price)
            .chain(std::iter::once(stop_loss))
            .chain(self.targets.iter().map(|t| t.price));
        for p in prices {
            if !p.is_finite() || p <= 0.0 {
                return Err(format!("invalid price {}", p));
            }
        }

        if self.targets.windows(2).any(|w| w[0].level >= w[1].level) {
            return Err("targets not ordered by level".to_string());
        }

        // Ladder must be strictly monotonic in the trade's favour.
        let ladder: Vec<f64> = std::iter::once(stop_loss)
            .chain(std::iter::once(self.entry_price))
            .chain(self.targets.iter().map(|t| t.price))
            .collect();
        let ordered = match self.direction {
            Direction::Long => ladder.windows(2).all(|w| w[0] < w[1]),
            Direction::Short => ladder.windows(2).all(|w| w[0] > w[1]),
        };
        if !ordered {
            return Err(format!(
                "{} price ladder out of order (stop {}, entry {}, targets {:?})",
                self.direction,
                stop_loss,
                self.entry_price,
                self.targets.iter().map(|t| t.price).collect::<Vec<_>>()
            ));
        }

        Ok(stop_loss)
    }

    pub fn target(&self, level: u32) -> Option<&Target> {
        self.targets.iter().find(|t| t.level == level)
    }

    /// Levels already flagged as hit on the record itself.
    pub fn hit_levels(&self) -> Vec<u32> {
        self.targets.iter().filter(|t| t.hit).map(|t| t.level).collect()
    }
}
