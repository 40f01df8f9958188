//! Governance engine facade: wires the calculators to their collaborators.

use crate::cache::VotingPowerCache;
use crate::call::bounded;
use crate::config::EngineConfig;
use crate::delegation::DelegationRegistry;
use crate::distribution::{compute_distribution, Distribution};
use crate::eligibility::EligibilityChecker;
use crate::error::{DelegationError, GovernanceError};
use crate::power::{PowerParams, VotingPowerCalculator};
use crate::spans::{distribution_span, vote_span};
use crate::votes::VoteRecorder;
use civitas_store::{
    DelegationStore, KvCache, ParticipationScore, ParticipationSource, StakeReader, SupplySource,
    VoteHistoryStore,
};
use civitas_types::{Address, Clock, ProposalId, VoteRecord, VotingMethod, VotingPower};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, Instrument};

/// External systems the engine reads from and writes to.
pub struct Collaborators {
    pub stakes: Arc<dyn StakeReader>,
    pub delegations: Arc<dyn DelegationStore>,
    pub cache: Arc<dyn KvCache>,
    pub history: Arc<dyn VoteHistoryStore>,
    pub supply: Arc<dyn SupplySource>,
    pub participation: Arc<dyn ParticipationSource>,
    pub clock: Arc<dyn Clock>,
}

pub struct GovernanceEngine {
    config: EngineConfig,
    calculator: Arc<VotingPowerCalculator>,
    registry: DelegationRegistry,
    eligibility: EligibilityChecker,
    recorder: VoteRecorder,
    supply: Arc<dyn SupplySource>,
    participation: Arc<dyn ParticipationSource>,
    /// Makes the eligibility check and the record of a cast vote atomic.
    vote_lock: Mutex<()>,
}

impl GovernanceEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self, GovernanceError> {
        config.validate()?;
        let timeout = config.call_timeout();
        let cache = Arc::new(VotingPowerCache::new(
            collaborators.cache,
            config.cache_ttl_secs,
            timeout,
        ));
        let calculator = Arc::new(VotingPowerCalculator::new(
            collaborators.stakes,
            collaborators.delegations.clone(),
            cache.clone(),
            collaborators.clock.clone(),
            PowerParams::from(&config),
        ));
        let registry = DelegationRegistry::new(
            collaborators.delegations,
            cache.clone(),
            config.max_delegation_depth,
            timeout,
        );
        let eligibility = EligibilityChecker::new(
            calculator.clone(),
            collaborators.history.clone(),
            config.vote_threshold(),
            config.proposal_threshold(),
            timeout,
        );
        let recorder = VoteRecorder::new(
            collaborators.history,
            cache,
            collaborators.clock,
            config.history_retention,
            timeout,
        );
        Ok(Self {
            config,
            calculator,
            registry,
            eligibility,
            recorder,
            supply: collaborators.supply,
            participation: collaborators.participation,
            vote_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current voting power; the zero record when it cannot be determined.
    pub async fn compute_voting_power(&self, address: &Address) -> VotingPower {
        self.calculator.compute_voting_power(address).await
    }

    pub async fn is_eligible_to_vote(&self, address: &Address, proposal: &ProposalId) -> bool {
        self.eligibility
            .can_vote(address, proposal)
            .instrument(vote_span(address, proposal))
            .await
    }

    pub async fn can_create_proposal(&self, address: &Address) -> bool {
        self.eligibility.can_create_proposal(address).await
    }

    pub async fn delegate(&self, from: &Address, to: &Address) -> Result<(), DelegationError> {
        self.registry.delegate(from, to).await
    }

    pub async fn undelegate(&self, from: &Address) -> Result<(), DelegationError> {
        self.registry.undelegate(from).await
    }

    pub async fn get_delegate(&self, address: &Address) -> Result<Option<Address>, DelegationError> {
        self.registry.get_delegate(address).await
    }

    /// Record a vote with an already computed `power`. Eligibility is not re-checked;
    /// use [`GovernanceEngine::cast_vote`] for a checked submission.
    pub async fn record_vote(
        &self,
        address: &Address,
        proposal: &ProposalId,
        power: &VotingPower,
        method: VotingMethod,
    ) -> Result<VoteRecord, GovernanceError> {
        self.recorder.record_vote(address, proposal, power, method).await
    }

    /// Check eligibility and record the vote as one step.
    ///
    /// Concurrent casts are serialized, so the same address cannot slip two
    /// votes on one proposal past the has-voted check.
    pub async fn cast_vote(
        &self,
        address: &Address,
        proposal: &ProposalId,
        method: VotingMethod,
    ) -> Result<VoteRecord, GovernanceError> {
        async {
            let _guard = self.vote_lock.lock().await;
            let power = self.eligibility.check_vote(address, proposal).await?;
            self.recorder.record_vote(address, proposal, &power, method).await
        }
        .instrument(vote_span(address, proposal))
        .await
    }

    /// Most recent votes of `address`, newest first.
    pub async fn get_voting_history(&self, address: &Address) -> Result<Vec<VoteRecord>, GovernanceError> {
        self.recorder.history(address).await
    }

    pub fn compute_quorum(&self, category: &str, total_supply: u128) -> u128 {
        self.config.quorum.compute_quorum(category, total_supply)
    }

    /// Quorum for `category` against the current total supply.
    pub async fn quorum_for(&self, category: &str) -> Result<u128, GovernanceError> {
        let supply = bounded(self.config.call_timeout(), "supply", self.supply.total_supply()).await?;
        Ok(self.compute_quorum(category, supply))
    }

    pub fn compute_distribution(
        &self,
        epoch: u64,
        participants: &[ParticipationScore],
        total_tokens: u128,
    ) -> Distribution {
        compute_distribution(epoch, participants, total_tokens, self.config.remainder_policy)
    }

    /// Distribute `total_tokens` over the participation scores recorded for `epoch`.
    pub async fn distribute_epoch(&self, epoch: u64, total_tokens: u128) -> Result<Distribution, GovernanceError> {
        async {
            let scores = bounded(
                self.config.call_timeout(),
                "participation",
                self.participation.scores(epoch),
            )
            .await?;
            let distribution = self.compute_distribution(epoch, &scores, total_tokens);
            info!(
                participants = distribution.allocations.len(),
                distributed = distribution.distributed,
                remainder = distribution.remainder,
                "epoch distributed"
            );
            Ok(distribution)
        }
        .instrument(distribution_span(epoch))
        .await
    }
}
