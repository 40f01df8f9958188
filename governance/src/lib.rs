//! Stake-weighted voting power for DAO governance.
//!
//! Voting power is the sum of an address's active stake plus a lockup bonus
//! that decays as the lockup runs out, plus whatever is delegated to it.
//! Around that sit eligibility rules, a bounded vote history, per-category
//! quorum and proportional epoch distribution.
//!
//! Everything external (ledger, delegation edges, cache, history, supply,
//! participation scores, clock) is injected through the `civitas-store`
//! traits; every call is bounded by a timeout and failures deny rather than
//! over-grant.

pub mod cache;
mod call;
pub mod config;
pub mod delegation;
pub mod distribution;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod power;
pub mod quorum;
pub mod spans;
pub mod votes;

/// Tracing target for data-integrity events: delegation cycles, depth cap
/// hits and stale cache reads.
pub const INTEGRITY_TARGET: &str = "civitas::integrity";

pub use cache::{CacheError, VotingPowerCache};
pub use config::EngineConfig;
pub use delegation::DelegationRegistry;
pub use distribution::{compute_distribution, Distribution, RemainderPolicy};
pub use eligibility::EligibilityChecker;
pub use engine::{Collaborators, GovernanceEngine};
pub use error::{DelegationError, GovernanceError, Ineligible};
pub use power::{lockup_bonus, position_power, PowerParams, StakePower, VotingPowerCalculator};
pub use quorum::QuorumTable;
pub use votes::VoteRecorder;
