//! Vote history records.

use crate::{Address, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a vote's weight was derived from voting power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingMethod {
    /// Weight = adjusted power.
    Standard,
    /// Weight = floor(sqrt(adjusted power)).
    Quadratic,
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// An immutable entry in an address's vote history.
///
/// `voting_power` is fixed at cast time; later power changes never touch it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub address: Address,
    pub proposal_id: ProposalId,
    pub voting_power: u128,
    pub method: VotingMethod,
    pub timestamp: Timestamp,
}
