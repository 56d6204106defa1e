//! The join attempt state machine.
//!
//! A single attempt walks `NotJoined → Submitting → Confirming → Joined`,
//! with `Submitting → Failed` and `Confirming → PendingOrFailed` as the only
//! error exits. There is no automatic retry: a failed attempt leaves the
//! candidate exactly where it started.

use secp256k1::SecretKey;
use tracing::{debug, warn};

use crate::confirm::Confirmer;
use crate::error::ServiceError;
use crate::query::ContestQuery;
use crate::submit::Submitter;
use crate::types::ConfirmationRecord;
use crate::util::{address_of, unix_now};
use crate::validate::validate_join;

#[derive(Debug)]
pub enum JoinState {
    NotJoined,
    Submitting,
    Confirming { tx_hash: String },
    Joined(ConfirmationRecord),
    Failed(ServiceError),
    PendingOrFailed { tx_hash: String },
}

impl JoinState {
    pub fn name(&self) -> &'static str {
        match self {
            JoinState::NotJoined => "not_joined",
            JoinState::Submitting => "submitting",
            JoinState::Confirming { .. } => "confirming",
            JoinState::Joined(_) => "joined",
            JoinState::Failed(_) => "failed",
            JoinState::PendingOrFailed { .. } => "pending_or_failed",
        }
    }
}

/// Drive one join attempt end to end with the candidate's own signing key:
/// pre-validate, submit the staked transaction, then confirm membership.
pub async fn run_join(
    query: &ContestQuery,
    submitter: &Submitter,
    confirmer: &Confirmer,
    contest_id: u64,
    signer: &SecretKey,
) -> JoinState {
    let candidate = address_of(signer);

    let (contest, participants) = match query.snapshot(contest_id).await {
        Ok(snapshot) => snapshot,
        Err(err) => return JoinState::Failed(err),
    };

    let check = validate_join(&contest, &participants, candidate, unix_now());
    if !check.allowed {
        debug!(contest_id, reasons = ?check.reasons, "join attempt rejected before submission");
        return JoinState::Failed(ServiceError::ValidationFailed(check.reasons));
    }

    debug!(contest_id, candidate = ?candidate, "submitting join");
    let outcome = match submitter.join_contest(contest_id, signer).await {
        Ok(outcome) => outcome,
        Err(err) => return JoinState::Failed(err),
    };

    let tx_hash = format!("{:?}", outcome.tx_hash);
    debug!(contest_id, %tx_hash, "confirming join");
    match confirmer.confirm_join(contest_id, candidate, &tx_hash).await {
        Ok(record) => JoinState::Joined(record),
        Err(ServiceError::PendingOrFailed) => {
            warn!(contest_id, %tx_hash, "join submitted but not yet visible");
            JoinState::PendingOrFailed { tx_hash }
        }
        Err(err) => JoinState::Failed(err),
    }
}
