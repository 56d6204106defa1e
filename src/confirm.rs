//! Join confirmation.
//!
//! After a client-side transaction completes, the recorder re-reads the
//! participant list and reports a normalized record. An absent candidate is
//! `PendingOrFailed`: without polling or an inclusion proof there is no way
//! to tell "still propagating" from "silently failed", so the ambiguity is
//! surfaced rather than guessed away.

use std::sync::Arc;

use chrono::Utc;
use web3::types::Address;

use crate::error::{Result, ServiceError};
use crate::registry::Registry;
use crate::types::ConfirmationRecord;

pub struct Confirmer {
    registry: Arc<dyn Registry>,
}

impl Confirmer {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    pub async fn confirm_join(
        &self,
        contest_id: u64,
        address: Address,
        tx_hash: &str,
    ) -> Result<ConfirmationRecord> {
        let participants = self.registry.participants(contest_id).await?;
        let position = participants
            .iter()
            .position(|p| *p == address)
            .ok_or(ServiceError::PendingOrFailed)?;
        Ok(ConfirmationRecord {
            contest_id,
            address,
            tx_hash: tx_hash.to_string(),
            position: position + 1,
            confirmed_at: Utc::now(),
        })
    }
}
