use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[serde(alias = "long", alias = "Long", alias = "BUY", alias = "buy")]
    Long,
    #[serde(alias = "short", alias = "Short", alias = "SELL", alias = "sell")]
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// Classification of what happened to a signal.
///
/// Serialized in upper case. Deserialization is the one place legacy values
/// from older signal feeds are accepted: spellings via [`FromStr`] and numeric
/// codes via [`Outcome::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "RawOutcome")]
pub enum Outcome {
    Winner,
    Partial,
    Loser,
    False,
    Pending,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Winner => "WINNER",
            Outcome::Partial => "PARTIAL",
            Outcome::Loser => "LOSER",
            Outcome::False => "FALSE",
            Outcome::Pending => "PENDING",
        }
    }

    /// Numeric result codes: `1` winner, `0.5` partial, `0` false, `-1` loser.
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(Outcome::Winner),
            c if c == 0.5 => Some(Outcome::Partial),
            c if c == 0.0 => Some(Outcome::False),
            c if c == -1.0 => Some(Outcome::Loser),
            _ => None,
        }
    }

    /// Outcomes after which no re-check is ever allowed, regardless of ledger history.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Winner | Outcome::Loser | Outcome::False)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winner" | "win" | "won" | "tp" | "tp_all" | "all_targets" => Ok(Outcome::Winner),
            "partial" | "partial_win" | "partially_hit" => Ok(Outcome::Partial),
            "loser" | "loss" | "lost" | "sl" | "stop_loss" | "stopped" => Ok(Outcome::Loser),
            "false" | "false_signal" | "missed" | "expired" | "no_hit" => Ok(Outcome::False),
            "pending" | "open" | "unresolved" => Ok(Outcome::Pending),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOutcome {
    Text(String),
    Code(f64),
}

impl TryFrom<RawOutcome> for Outcome {
    type Error = String;

    fn try_from(value: RawOutcome) -> Result<Self, Self::Error> {
        match value {
            RawOutcome::Text(s) => s.parse(),
            RawOutcome::Code(c) => {
                Outcome::from_code(c).ok_or_else(|| format!("unknown outcome code {}", c))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    #[serde(alias = "PENDING", alias = "active", alias = "pending")]
    Active,
    #[serde(alias = "waiting")]
    Waiting,
    #[serde(alias = "completed")]
    Completed,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Active => write!(f, "ACTIVE"),
            SignalStatus::Waiting => write!(f, "WAITING"),
            SignalStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Initial,
    Revalidation,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::Initial => write!(f, "initial"),
            ValidationKind::Revalidation => write!(f, "revalidation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accepts_legacy_spellings() {
        assert_eq!("win".parse::<Outcome>().unwrap(), Outcome::Winner);
        assert_eq!("TP_ALL".parse::<Outcome>().unwrap(), Outcome::Winner);
        assert_eq!("Stop_Loss".parse::<Outcome>().unwrap(), Outcome::Loser);
        assert_eq!("missed".parse::<Outcome>().unwrap(), Outcome::False);
        assert_eq!(" partial ".parse::<Outcome>().unwrap(), Outcome::Partial);
        assert!("maybe".parse::<Outcome>().is_err());
    }

    #[test]
    fn outcome_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&Outcome::False).unwrap(), "\"FALSE\"");
        let o: Outcome = serde_json::from_str("\"loss\"").unwrap();
        assert_eq!(o, Outcome::Loser);
    }

    #[test]
    fn outcome_accepts_numeric_codes() {
        let codes: Vec<Outcome> = serde_json::from_str("[1, 0.5, 0, -1, \"win\"]").unwrap();
        assert_eq!(
            codes,
            vec![
                Outcome::Winner,
                Outcome::Partial,
                Outcome::False,
                Outcome::Loser,
                Outcome::Winner
            ]
        );
        assert!(serde_json::from_str::<Outcome>("7").is_err());
    }

    #[test]
    fn terminal_outcomes() {
        assert!(Outcome::Winner.is_terminal());
        assert!(Outcome::Loser.is_terminal());
        assert!(Outcome::False.is_terminal());
        assert!(!Outcome::Partial.is_terminal());
        assert!(!Outcome::Pending.is_terminal());
    }

    #[test]
    fn direction_accepts_lower_case() {
        let d: Direction = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(d, Direction::Short);
        assert_eq!(Direction::Long.to_string(), "LONG");
    }
}
