//! Vote and proposal eligibility.

use crate::call::bounded;
use crate::error::Ineligible;
use crate::power::VotingPowerCalculator;
use civitas_store::VoteHistoryStore;
use civitas_types::{Address, ProposalId, VotingPower};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether an address may vote on a proposal or create one.
///
/// Read-only. Unavailable power reads as zero, so failures deny.
pub struct EligibilityChecker {
    calculator: Arc<VotingPowerCalculator>,
    history: Arc<dyn VoteHistoryStore>,
    vote_threshold: u128,
    proposal_threshold: u128,
    timeout: Duration,
}

impl EligibilityChecker {
    pub fn new(
        calculator: Arc<VotingPowerCalculator>,
        history: Arc<dyn VoteHistoryStore>,
        vote_threshold: u128,
        proposal_threshold: u128,
        timeout: Duration,
    ) -> Self {
        Self {
            calculator,
            history,
            vote_threshold,
            proposal_threshold,
            timeout,
        }
    }

    /// The power `address` would vote with on `proposal`, or why it may not.
    ///
    /// Checks run in order: prior vote, outgoing delegation, power threshold.
    pub async fn check_vote(&self, address: &Address, proposal: &ProposalId) -> Result<VotingPower, Ineligible> {
        match bounded(self.timeout, "history", self.history.has_voted(address, proposal)).await {
            Ok(true) => return Err(Ineligible::AlreadyVoted),
            Ok(false) => {}
            Err(e) => {
                warn!(%address, %proposal, error = %e, "vote history unavailable; denying");
                return Err(Ineligible::HistoryUnavailable);
            }
        }

        let power = self.calculator.compute_voting_power(address).await;
        if let Some(delegate) = &power.delegated_to {
            return Err(Ineligible::Delegated(delegate.clone()));
        }
        Self::meets(power, self.vote_threshold)
    }

    pub async fn can_vote(&self, address: &Address, proposal: &ProposalId) -> bool {
        let verdict = self.check_vote(address, proposal).await;
        if let Err(reason) = &verdict {
            debug!(%address, %proposal, %reason, "not eligible to vote");
        }
        verdict.is_ok()
    }

    /// The power `address` holds if it may create a proposal.
    pub async fn check_proposal(&self, address: &Address) -> Result<VotingPower, Ineligible> {
        let power = self.calculator.compute_voting_power(address).await;
        Self::meets(power, self.proposal_threshold)
    }

    pub async fn can_create_proposal(&self, address: &Address) -> bool {
        self.check_proposal(address).await.is_ok()
    }

    fn meets(power: VotingPower, need: u128) -> Result<VotingPower, Ineligible> {
        if power.adjusted_power < need {
            return Err(Ineligible::InsufficientPower {
                have: power.adjusted_power,
                need,
            });
        }
        Ok(power)
    }
}
