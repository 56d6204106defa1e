//! Contest query service.
//!
//! Read-side wrapper over the registry. Contest detail and listing reads mask
//! registry communication failures with deterministic synthesized
//! placeholders, tagged so callers never mistake them for authoritative data;
//! `NotFound` and everything on a mutating path always propagates.

use std::sync::Arc;

use tracing::warn;
use web3::types::Address;

use crate::error::{Result, ServiceError};
use crate::registry::Registry;
use crate::types::{Contest, ContestStats, ContestView, UserContestEntry};
use crate::util::unix_now;

/// Number of placeholder entries served when even the contest count cannot be
/// fetched.
const SYNTHESIZED_LIST_LEN: u64 = 2;

pub struct ContestQuery {
    registry: Arc<dyn Registry>,
}

impl ContestQuery {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Contest plus participant list, straight from the registry. No
    /// placeholder substitution: validation and confirmation must never run
    /// against synthesized data.
    pub async fn snapshot(&self, id: u64) -> Result<(Contest, Vec<Address>)> {
        let contest = self.registry.contest(id).await?;
        let participants = self.registry.participants(id).await?;
        Ok((contest, participants))
    }

    /// Caller-facing contest view. Falls back to a synthesized placeholder
    /// when the registry cannot be reached; `NotFound` still propagates so a
    /// bad id is not dressed up as data.
    pub async fn contest(&self, id: u64) -> Result<(ContestView, Vec<Address>)> {
        match self.snapshot(id).await {
            Ok((contest, participants)) => {
                let view = ContestView::live(&contest, participants.len(), unix_now());
                Ok((view, participants))
            }
            Err(ServiceError::NetworkUnavailable(reason)) => {
                warn!(contest_id = id, %reason, "registry unreachable, serving synthesized contest");
                Ok((ContestView::synthesized(id), Vec::new()))
            }
            Err(other) => Err(other),
        }
    }

    /// All known contests, by walking ids `1..=contestCount`. Ids that no
    /// longer resolve (a creation raced the count read) are skipped.
    pub async fn list(&self) -> Result<Vec<ContestView>> {
        let count = match self.registry.contest_count().await {
            Ok(count) => count,
            Err(ServiceError::NetworkUnavailable(reason)) => {
                warn!(%reason, "registry unreachable, serving synthesized contest list");
                return Ok((1..=SYNTHESIZED_LIST_LEN)
                    .map(ContestView::synthesized)
                    .collect());
            }
            Err(other) => return Err(other),
        };

        let mut contests = Vec::with_capacity(count as usize);
        for id in 1..=count {
            match self.contest(id).await {
                Ok((view, _)) => contests.push(view),
                Err(ServiceError::NotFound(_)) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(contests)
    }

    pub async fn joined(&self, id: u64, address: Address) -> Result<bool> {
        self.registry.is_participant(id, address).await
    }

    pub async fn stats(&self, id: u64) -> Result<ContestStats> {
        let (contest, participants) = self.snapshot(id).await?;
        Ok(ContestStats::build(&contest, &participants, unix_now()))
    }

    /// Contests an address participates in, swept over the full id range.
    pub async fn user_contests(&self, address: Address) -> Result<Vec<UserContestEntry>> {
        let count = self.registry.contest_count().await?;
        let mut entries = Vec::new();
        for id in 1..=count {
            let (contest, participants) = match self.snapshot(id).await {
                Ok(snapshot) => snapshot,
                Err(ServiceError::NotFound(_)) => continue,
                Err(other) => return Err(other),
            };
            if participants.contains(&address) {
                entries.push(UserContestEntry {
                    contest_id: contest.id,
                    name: contest.name,
                    stake_amount: contest.stake_amount.to_string(),
                    status: if contest.rewards_distributed {
                        "completed"
                    } else {
                        "active"
                    },
                });
            }
        }
        Ok(entries)
    }
}
