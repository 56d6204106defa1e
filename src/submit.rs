//! Join and admin submission.
//!
//! The submitter builds mutating registry calls and awaits their receipts.
//! Joins are signed with the end user's own key and carry the contest's exact
//! stake as call value; createContest and distributeRewards are signed with
//! the operator key and are unavailable (`AdminNotConfigured`) when none is
//! configured. Mutating paths never substitute synthetic success.

use std::sync::Arc;

use secp256k1::SecretKey;
use tracing::info;
use web3::types::Address;

use crate::config::ChainConfig;
use crate::error::{Result, ServiceError};
use crate::registry::Registry;
use crate::types::{CreatedContest, NewContest, TxOutcome};
use crate::util::parse_secret_key;

pub struct Submitter {
    registry: Arc<dyn Registry>,
    operator: Option<SecretKey>,
}

impl Submitter {
    pub fn new(registry: Arc<dyn Registry>, operator: Option<SecretKey>) -> Self {
        Self { registry, operator }
    }

    pub fn from_config(registry: Arc<dyn Registry>, chain: &ChainConfig) -> Result<Self> {
        let operator = chain
            .operator_secret
            .as_deref()
            .map(parse_secret_key)
            .transpose()?;
        Ok(Self::new(registry, operator))
    }

    pub fn admin_enabled(&self) -> bool {
        self.operator.is_some()
    }

    fn operator(&self) -> Result<&SecretKey> {
        self.operator.as_ref().ok_or(ServiceError::AdminNotConfigured)
    }

    /// Submit a join for the signer, staking the contest's configured amount.
    /// The receipt is awaited before returning; a mismatched stake would be
    /// rejected by the registry itself.
    pub async fn join_contest(&self, id: u64, signer: &SecretKey) -> Result<TxOutcome> {
        let contest = self.registry.contest(id).await?;
        let outcome = self.registry.join(id, contest.stake_amount, signer).await?;
        info!(
            contest_id = id,
            tx = ?outcome.tx_hash,
            confirmed = outcome.confirmed,
            "join submitted"
        );
        Ok(outcome)
    }

    pub async fn create_contest(&self, params: &NewContest) -> Result<CreatedContest> {
        let signer = self.operator()?;
        params.check().map_err(ServiceError::InvalidRequest)?;
        let created = self.registry.create_contest(params, signer).await?;
        info!(
            name = %params.name,
            contest_id = ?created.contest_id,
            tx = ?created.tx_hash,
            "contest created"
        );
        Ok(created)
    }

    pub async fn distribute_rewards(&self, id: u64, winners: [Address; 3]) -> Result<TxOutcome> {
        let signer = self.operator()?;
        let outcome = self.registry.distribute_rewards(id, winners, signer).await?;
        info!(contest_id = id, tx = ?outcome.tx_hash, "rewards distributed");
        Ok(outcome)
    }
}
