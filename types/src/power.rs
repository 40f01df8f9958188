//! Computed voting power snapshot.

use crate::{isqrt, Address, Timestamp, VotingMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-address voting power, computed and cached as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPower {
    pub address: Address,
    /// Sum of active stake, own plus delegated in.
    pub raw_power: u128,
    /// Raw power plus the time-decaying lockup bonus, own plus delegated in.
    pub adjusted_power: u128,
    /// `floor(sqrt(adjusted_power))`.
    pub quadratic_power: u128,
    /// Outgoing delegation; when set the address cannot vote directly.
    pub delegated_to: Option<Address>,
    /// Direct delegators of this address.
    pub delegated_from: BTreeSet<Address>,
    pub last_calculated: Timestamp,
}

impl VotingPower {
    /// The fail-closed record returned whenever power cannot be determined.
    pub fn zero(address: Address, now: Timestamp) -> Self {
        Self {
            address,
            raw_power: 0,
            adjusted_power: 0,
            quadratic_power: 0,
            delegated_to: None,
            delegated_from: BTreeSet::new(),
            last_calculated: now,
        }
    }

    /// Assemble a record, deriving the quadratic component.
    pub fn from_parts(
        address: Address,
        raw_power: u128,
        adjusted_power: u128,
        delegated_to: Option<Address>,
        delegated_from: BTreeSet<Address>,
        now: Timestamp,
    ) -> Self {
        Self {
            address,
            raw_power,
            adjusted_power,
            quadratic_power: isqrt(adjusted_power),
            delegated_to,
            delegated_from,
            last_calculated: now,
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.delegated_to.is_some()
    }

    /// The weight this power carries under a voting method.
    pub fn weight_for(&self, method: VotingMethod) -> u128 {
        match method {
            VotingMethod::Standard => self.adjusted_power,
            VotingMethod::Quadratic => self.quadratic_power,
        }
    }
}
