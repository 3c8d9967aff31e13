use crate::core::ValidationResult;
use crate::error::ValidationError;
use crate::models::{Outcome, ValidationKind};
use crate::validation::ledger::ValidationRecord;

/// Where a signal stands according to its ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    Unvalidated,
    /// Last decision was PENDING; re-checkable until the horizon expires.
    Pending,
    /// One PARTIAL recorded; exactly one revalidation remains.
    PartialOpen,
    Finalized(Outcome),
}

/// Go-ahead for one validation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Permit {
    pub kind: ValidationKind,
    pub previous: Option<Outcome>,
    pub previous_hits: Vec<u32>,
}

/// At-most-one re-check for PARTIAL outcomes, decided from ledger records only.
pub struct RevalidationPolicy;

impl RevalidationPolicy {
    pub fn state(records: &[ValidationRecord]) -> PolicyState {
        if let Some(r) = records.iter().find(|r| r.new_result.is_terminal()) {
            return PolicyState::Finalized(r.new_result);
        }
        let revalidations = records
            .iter()
            .filter(|r| r.kind == ValidationKind::Revalidation)
            .count();
        if revalidations > 0 {
            return PolicyState::Finalized(Outcome::Partial);
        }
        if records.iter().any(|r| r.new_result == Outcome::Partial) {
            return PolicyState::PartialOpen;
        }
        if records.is_empty() {
            PolicyState::Unvalidated
        } else {
            PolicyState::Pending
        }
    }

    pub fn is_finalized(records: &[ValidationRecord]) -> bool {
        matches!(Self::state(records), PolicyState::Finalized(_))
    }

    /// True only for a PARTIAL that has not used its re-check yet.
    pub fn can_revalidate(records: &[ValidationRecord]) -> bool {
        Self::state(records) == PolicyState::PartialOpen
    }

    pub fn permit(
        signal_id: &str,
        records: &[ValidationRecord],
    ) -> Result<Permit, ValidationError> {
        let last = records.last();
        let previous = last.map(|r| r.new_result);
        let previous_hits = last.map(|r| r.hit_levels.clone()).unwrap_or_default();

        match Self::state(records) {
            PolicyState::Finalized(outcome) => Err(ValidationError::PolicyViolation {
                signal_id: signal_id.to_string(),
                reason: match outcome {
                    Outcome::Partial => "PARTIAL already used its one revalidation".to_string(),
                    other => format!("already finalized as {}", other),
                },
            }),
            PolicyState::PartialOpen => Ok(Permit {
                kind: ValidationKind::Revalidation,
                previous,
                previous_hits,
            }),
            PolicyState::Unvalidated | PolicyState::Pending => Ok(Permit {
                kind: ValidationKind::Initial,
                previous,
                previous_hits,
            }),
        }
    }
}

impl Permit {
    /// Map a fresh evaluation through the revalidation rules.
    ///
    /// Initial attempts pass through. A PARTIAL re-check either promotes to
    /// WINNER or stays PARTIAL; a later stop-out never downgrades it to LOSER.
    /// Confirmed targets are the union of both attempts.
    pub fn resolve(&self, fresh: ValidationResult) -> ValidationResult {
        if self.kind == ValidationKind::Initial || fresh.outcome == Outcome::Winner {
            return fresh;
        }

        let mut hits = self.previous_hits.clone();
        hits.extend(fresh.hit_levels.iter().copied());
        hits.sort_unstable();
        hits.dedup();

        ValidationResult {
            outcome: Outcome::Partial,
            hit_levels: hits,
            extreme_price: fresh.extreme_price,
            decided_at: fresh.decided_at,
            explanation: format!(
                "revalidated as {} ({}); partial result kept and finalized",
                fresh.outcome, fresh.explanation
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::base_time;

    fn rec(prev: Option<Outcome>, new: Outcome, kind: ValidationKind) -> ValidationRecord {
        ValidationRecord {
            signal_id: "s".to_string(),
            validated_at: base_time(),
            previous_result: prev,
            new_result: new,
            kind,
            hit_levels: if new == Outcome::Partial { vec![1] } else { vec![] },
            extreme_price: None,
            profit_pct: None,
        }
    }

    fn fresh(outcome: Outcome, hits: Vec<u32>) -> ValidationResult {
        ValidationResult {
            outcome,
            hit_levels: hits,
            extreme_price: None,
            decided_at: None,
            explanation: "x".to_string(),
        }
    }

    #[test]
    fn empty_ledger_is_unvalidated() {
        assert_eq!(RevalidationPolicy::state(&[]), PolicyState::Unvalidated);
        let p = RevalidationPolicy::permit("s", &[]).unwrap();
        assert_eq!(p.kind, ValidationKind::Initial);
        assert_eq!(p.previous, None);
    }

    #[test]
    fn terminal_outcomes_block() {
        for o in [Outcome::Winner, Outcome::Loser, Outcome::False] {
            let records = vec![rec(None, o, ValidationKind::Initial)];
            assert!(RevalidationPolicy::is_finalized(&records));
            let err = RevalidationPolicy::permit("s", &records).unwrap_err();
            assert!(err.is_policy_violation());
        }
    }

    #[test]
    fn pending_stays_checkable() {
        let records = vec![
            rec(None, Outcome::Pending, ValidationKind::Initial),
            rec(Some(Outcome::Pending), Outcome::Pending, ValidationKind::Initial),
        ];
        assert_eq!(RevalidationPolicy::state(&records), PolicyState::Pending);
        assert!(!RevalidationPolicy::can_revalidate(&records));
        let p = RevalidationPolicy::permit("s", &records).unwrap();
        assert_eq!(p.kind, ValidationKind::Initial);
        assert_eq!(p.previous, Some(Outcome::Pending));
    }

    #[test]
    fn partial_allows_exactly_one_recheck() {
        let mut records = vec![rec(None, Outcome::Partial, ValidationKind::Initial)];
        assert!(RevalidationPolicy::can_revalidate(&records));
        let p = RevalidationPolicy::permit("s", &records).unwrap();
        assert_eq!(p.kind, ValidationKind::Revalidation);
        assert_eq!(p.previous_hits, vec![1]);

        records.push(rec(
            Some(Outcome::Partial),
            Outcome::Partial,
            ValidationKind::Revalidation,
        ));
        assert_eq!(
            RevalidationPolicy::state(&records),
            PolicyState::Finalized(Outcome::Partial)
        );
        assert!(RevalidationPolicy::permit("s", &records).is_err());
    }

    #[test]
    fn revalidation_never_downgrades() {
        let records = vec![rec(None, Outcome::Partial, ValidationKind::Initial)];
        let p = RevalidationPolicy::permit("s", &records).unwrap();

        let r = p.resolve(fresh(Outcome::Loser, vec![]));
        assert_eq!(r.outcome, Outcome::Partial);
        assert_eq!(r.hit_levels, vec![1]);

        let r = p.resolve(fresh(Outcome::Partial, vec![1, 2]));
        assert_eq!(r.outcome, Outcome::Partial);
        assert_eq!(r.hit_levels, vec![1, 2]);

        let r = p.resolve(fresh(Outcome::Winner, vec![1, 2, 3]));
        assert_eq!(r.outcome, Outcome::Winner);
    }

    #[test]
    fn initial_passes_through() {
        let p = RevalidationPolicy::permit("s", &[]).unwrap();
        let r = p.resolve(fresh(Outcome::Loser, vec![]));
        assert_eq!(r.outcome, Outcome::Loser);
    }
}
