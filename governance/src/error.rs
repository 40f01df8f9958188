use civitas_store::StoreError;
use civitas_types::Address;
use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("delegation error: {0}")]
    Delegation(#[from] DelegationError),

    #[error("not eligible: {0}")]
    Ineligible(#[from] Ineligible),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("{0} did not answer in time")]
    Timeout(&'static str),

    #[error("config error: {0}")]
    Config(String),
}

/// Rejections of `delegate` / `undelegate`. Nothing is written when one is returned.
#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("delegating {from} to {to} would create a cycle")]
    CyclicDelegation { from: Address, to: Address },

    #[error("delegation chain through {0} exceeds the maximum depth")]
    ChainTooDeep(Address),

    /// Stored edges already loop; nothing may be attached to the loop.
    #[error("stored delegation chain from {0} loops")]
    CorruptGraph(Address),

    #[error("delegation data unavailable: {0}")]
    Unavailable(String),
}

impl From<GovernanceError> for DelegationError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Delegation(inner) => inner,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Why an address may not vote or propose.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Ineligible {
    #[error("address has already voted on this proposal")]
    AlreadyVoted,

    #[error("voting power is delegated to {0}")]
    Delegated(Address),

    #[error("insufficient voting power: have {have}, need {need}")]
    InsufficientPower { have: u128, need: u128 },

    #[error("vote history unavailable")]
    HistoryUnavailable,
}
