//! Staking positions as reported by the ledger.

use crate::{Address, Timestamp, TypesError};
use serde::{Deserialize, Serialize};

/// One stake lot owned by an address.
///
/// Positions are created by an external staking transaction and never mutated;
/// re-staking produces a new position. A position stops counting once
/// `now >= end_time`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPosition {
    pub owner: Address,
    /// Staked token units, always non-zero.
    pub amount: u128,
    pub start_time: Timestamp,
    /// Always `start_time + lockup_period_secs`.
    pub end_time: Timestamp,
    pub lockup_period_secs: u64,
}

impl StakingPosition {
    /// Build a position, deriving `end_time` from the lockup period.
    pub fn new(
        owner: Address,
        amount: u128,
        start_time: Timestamp,
        lockup_period_secs: u64,
    ) -> Result<Self, TypesError> {
        if amount == 0 {
            return Err(TypesError::ZeroAmount);
        }
        let end_time = start_time
            .checked_add_secs(lockup_period_secs)
            .ok_or(TypesError::LockupOverflow)?;
        Ok(Self {
            owner,
            amount,
            start_time,
            end_time,
            lockup_period_secs,
        })
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.end_time
    }

    /// Seconds of lockup left at `now` (zero once expired).
    pub fn remaining_lockup(&self, now: Timestamp) -> u64 {
        self.end_time.remaining_from(now)
    }

    /// Whether the stored fields satisfy the position invariants.
    ///
    /// Positions deserialized from an external source bypass [`StakingPosition::new`],
    /// so readers check this before trusting them.
    pub fn is_well_formed(&self) -> bool {
        self.amount > 0
            && self.start_time.checked_add_secs(self.lockup_period_secs) == Some(self.end_time)
    }
}
