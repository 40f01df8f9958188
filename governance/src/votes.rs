//! Vote recording and bounded per-address history.

use crate::cache::VotingPowerCache;
use crate::call::bounded;
use crate::GovernanceError;
use civitas_store::VoteHistoryStore;
use civitas_types::{Address, Clock, ProposalId, VoteRecord, VotingMethod, VotingPower};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct VoteRecorder {
    history: Arc<dyn VoteHistoryStore>,
    cache: Arc<VotingPowerCache>,
    clock: Arc<dyn Clock>,
    retention: usize,
    timeout: Duration,
}

impl VoteRecorder {
    pub fn new(
        history: Arc<dyn VoteHistoryStore>,
        cache: Arc<VotingPowerCache>,
        clock: Arc<dyn Clock>,
        retention: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            history,
            cache,
            clock,
            retention,
            timeout,
        }
    }

    /// Append a vote by `address` on `proposal` weighted by `power` under `method`.
    ///
    /// The caller is responsible for having checked eligibility; nothing is
    /// re-checked here. The recorded weight is fixed at cast time.
    pub async fn record_vote(
        &self,
        address: &Address,
        proposal: &ProposalId,
        power: &VotingPower,
        method: VotingMethod,
    ) -> Result<VoteRecord, GovernanceError> {
        let record = VoteRecord {
            address: address.clone(),
            proposal_id: proposal.clone(),
            voting_power: power.weight_for(method),
            method,
            timestamp: self.clock.now(),
        };
        bounded(
            self.timeout,
            "history",
            self.history.append(record.clone(), self.retention),
        )
        .await?;
        info!(%address, %proposal, %method, weight = record.voting_power, "vote recorded");

        if let Err(e) = self.cache.invalidate(address).await {
            warn!(%address, error = %e, "cache delete after vote failed; entry fenced by version");
        }
        Ok(record)
    }

    /// Most recent votes of `address`, newest first, at most `retention` of them.
    pub async fn history(&self, address: &Address) -> Result<Vec<VoteRecord>, GovernanceError> {
        let mut records = bounded(self.timeout, "history", self.history.history(address)).await?;
        records.truncate(self.retention);
        Ok(records)
    }
}
