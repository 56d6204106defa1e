//! Join pre-validation.
//!
//! A pure function over a contest snapshot, its participant list, the
//! candidate address, and the clock. Every violated rule is reported, not
//! just the first, so a caller can show the full picture. The registry
//! remains the sole arbiter: two concurrent validations can both pass before
//! either transaction lands.

use web3::types::Address;

use crate::types::{Contest, JoinCheck};

pub const REASON_NOT_STARTED: &str = "not started";
pub const REASON_ENDED: &str = "ended";
pub const REASON_FULL: &str = "full";
pub const REASON_ALREADY_JOINED: &str = "already joined";

pub fn validate_join(
    contest: &Contest,
    participants: &[Address],
    candidate: Address,
    now: u64,
) -> JoinCheck {
    let mut reasons = Vec::new();

    if now < contest.start_time {
        reasons.push(REASON_NOT_STARTED.to_string());
    } else if now > contest.end_time {
        reasons.push(REASON_ENDED.to_string());
    }

    if participants.len() >= contest.max_participants as usize {
        reasons.push(REASON_FULL.to_string());
    }

    if participants.contains(&candidate) {
        reasons.push(REASON_ALREADY_JOINED.to_string());
    }

    JoinCheck {
        allowed: reasons.is_empty(),
        reasons,
    }
}
