//! Domain types shared across the service.
//!
//! The registry owns contest and participant truth; everything here is a
//! read-only copy fetched per request, or a derived view of one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use web3::types::{Address, H256, U256};

/// A contest as stored by the registry.
///
/// `id` is assigned by the registry on creation. Apart from the participant
/// set and the one-way `rewards_distributed` flip, a contest is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: u64,
    pub name: String,
    /// Entry stake in the smallest currency unit (wei).
    pub stake_amount: U256,
    pub start_time: u64,
    pub end_time: u64,
    pub max_participants: u32,
    pub min_participants: u32,
    pub rewards_distributed: bool,
}

impl Contest {
    pub fn is_active(&self, now: u64) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// The registry returns an all-zero record for ids it has never assigned.
    /// An empty name alone is not enough: a real contest may carry one, but it
    /// will always have a nonzero end time.
    pub fn is_zero_shape(&self) -> bool {
        self.name.is_empty() && self.end_time == 0
    }
}

/// Caller-facing projection of a contest, as served by the read endpoints.
///
/// `synthesized` marks placeholder data substituted when the registry could
/// not be reached; synthesized entries are never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestView {
    pub contest_id: u64,
    pub name: String,
    pub stake_amount: String,
    pub start_time: u64,
    pub end_time: u64,
    pub max_participants: u32,
    pub min_participants: u32,
    pub participant_count: usize,
    pub is_active: bool,
    pub rewards_distributed: bool,
    pub synthesized: bool,
}

impl ContestView {
    pub fn live(contest: &Contest, participant_count: usize, now: u64) -> Self {
        Self {
            contest_id: contest.id,
            name: contest.name.clone(),
            stake_amount: contest.stake_amount.to_string(),
            start_time: contest.start_time,
            end_time: contest.end_time,
            max_participants: contest.max_participants,
            min_participants: contest.min_participants,
            participant_count,
            is_active: contest.is_active(now),
            rewards_distributed: contest.rewards_distributed,
            synthesized: false,
        }
    }

    /// Deterministic placeholder derived from the contest index only, so two
    /// fallback reads of the same id agree.
    pub fn synthesized(id: u64) -> Self {
        Self {
            contest_id: id,
            name: format!("Contest #{}", id),
            stake_amount: placeholder_stake(id).to_string(),
            start_time: 0,
            end_time: 0,
            max_participants: 0,
            min_participants: 0,
            participant_count: 0,
            is_active: false,
            rewards_distributed: false,
            synthesized: true,
        }
    }
}

/// Placeholder stake tied to the contest index: 0.001 native units per index.
pub fn placeholder_stake(id: u64) -> U256 {
    U256::from(id) * U256::exp10(15)
}

/// Aggregate numbers for one contest, shaped for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestStats {
    pub contest_id: u64,
    pub participant_count: usize,
    pub max_participants: u32,
    pub min_participants: u32,
    pub stake_amount: String,
    pub total_staked: String,
    pub is_active: bool,
    pub has_ended: bool,
    pub rewards_distributed: bool,
    pub can_join: bool,
}

impl ContestStats {
    pub fn build(contest: &Contest, participants: &[Address], now: u64) -> Self {
        let count = participants.len();
        let is_active = contest.is_active(now);
        Self {
            contest_id: contest.id,
            participant_count: count,
            max_participants: contest.max_participants,
            min_participants: contest.min_participants,
            stake_amount: contest.stake_amount.to_string(),
            total_staked: (contest.stake_amount * U256::from(count)).to_string(),
            is_active,
            has_ended: now > contest.end_time,
            rewards_distributed: contest.rewards_distributed,
            can_join: is_active
                && count < contest.max_participants as usize
                && !contest.rewards_distributed,
        }
    }
}

/// Outcome of a join pre-validation. Computed fresh from registry state and
/// the clock, never cached; `allowed` holds exactly when `reasons` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinCheck {
    pub allowed: bool,
    pub reasons: Vec<String>,
}

/// Parameters for an admin-signed contest creation.
#[derive(Debug, Clone)]
pub struct NewContest {
    pub name: String,
    pub stake_amount: U256,
    pub start_time: u64,
    pub end_time: u64,
    pub max_participants: u32,
    pub min_participants: u32,
}

impl NewContest {
    /// Contest invariants checked before anything is submitted.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.name.is_empty() {
            return Err("contest name must not be empty".into());
        }
        if self.start_time >= self.end_time {
            return Err("start time must precede end time".into());
        }
        if self.max_participants < self.min_participants {
            return Err("max participants must be at least min participants".into());
        }
        Ok(())
    }
}

/// Result of a mutating registry call after its receipt was observed.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub confirmed: bool,
}

/// Result of a contest creation, with the id parsed from the
/// `ContestCreated` event when present in the receipt logs.
#[derive(Debug, Clone)]
pub struct CreatedContest {
    pub contest_id: Option<u64>,
    pub tx_hash: H256,
    pub confirmed: bool,
}

/// Normalized record returned once a join is visible in the participant list.
///
/// `confirmed_at` is the wall-clock time of this check, not the on-chain
/// inclusion time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRecord {
    pub contest_id: u64,
    pub address: Address,
    pub tx_hash: String,
    /// 1-based index in the participant list.
    pub position: usize,
    pub confirmed_at: DateTime<Utc>,
}

/// One row of a user's contest history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContestEntry {
    pub contest_id: u64,
    pub name: String,
    pub stake_amount: String,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest() -> Contest {
        Contest {
            id: 1,
            name: "Push-up Challenge".into(),
            stake_amount: U256::exp10(17),
            start_time: 1_000,
            end_time: 2_000,
            max_participants: 100,
            min_participants: 5,
            rewards_distributed: false,
        }
    }

    #[test]
    fn active_window_is_inclusive() {
        let c = contest();
        assert!(c.is_active(1_000));
        assert!(c.is_active(2_000));
        assert!(!c.is_active(999));
        assert!(!c.is_active(2_001));
    }

    #[test]
    fn zero_shape_requires_empty_name_and_zero_end() {
        let mut c = contest();
        c.name.clear();
        assert!(!c.is_zero_shape());
        c.end_time = 0;
        assert!(c.is_zero_shape());
    }

    #[test]
    fn live_view_carries_decimal_stake() {
        let view = ContestView::live(&contest(), 3, 1_500);
        assert_eq!(view.stake_amount, "100000000000000000");
        assert_eq!(view.participant_count, 3);
        assert!(view.is_active);
        assert!(!view.synthesized);
    }

    #[test]
    fn synthesized_view_is_deterministic_and_tagged() {
        let a = ContestView::synthesized(5);
        let b = ContestView::synthesized(5);
        assert_eq!(a.name, b.name);
        assert_eq!(a.stake_amount, b.stake_amount);
        assert!(!a.name.is_empty());
        assert!(a.synthesized);
        assert_eq!(a.stake_amount, "5000000000000000");
    }

    #[test]
    fn stats_totals_scale_with_participants() {
        let addrs = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let stats = ContestStats::build(&contest(), &addrs, 1_500);
        assert_eq!(stats.total_staked, "200000000000000000");
        assert!(stats.can_join);

        let ended = ContestStats::build(&contest(), &addrs, 3_000);
        assert!(ended.has_ended);
        assert!(!ended.can_join);
    }

    #[test]
    fn new_contest_invariants() {
        let mut params = NewContest {
            name: "Squat Master".into(),
            stake_amount: U256::exp10(16),
            start_time: 10,
            end_time: 20,
            max_participants: 10,
            min_participants: 2,
        };
        assert!(params.check().is_ok());

        params.start_time = 20;
        assert!(params.check().is_err());

        params.start_time = 10;
        params.min_participants = 50;
        assert!(params.check().is_err());
    }
}
