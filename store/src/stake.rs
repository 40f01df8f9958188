//! Ledger / staking read trait.

use crate::StoreError;
use async_trait::async_trait;
use civitas_types::{Address, StakingPosition, Timestamp};

/// Reads staking positions from the ledger.
///
/// Must be idempotent and side-effect free.
#[async_trait]
pub trait StakeReader: Send + Sync {
    /// Positions owned by `address` that are still locked at `as_of`.
    async fn active_positions(
        &self,
        address: &Address,
        as_of: Timestamp,
    ) -> Result<Vec<StakingPosition>, StoreError>;
}
