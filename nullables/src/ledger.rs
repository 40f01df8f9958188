//! Nullable ledger: in-memory staking positions.

use crate::Faults;
use async_trait::async_trait;
use civitas_store::{StakeReader, StoreError};
use civitas_types::{Address, StakingPosition, Timestamp};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// An in-memory staking ledger for testing.
///
/// Counts reads so tests can assert that cache hits never reach the ledger.
#[derive(Default)]
pub struct NullLedger {
    positions: Mutex<HashMap<Address, Vec<StakingPosition>>>,
    reads: AtomicU64,
    pub faults: Faults,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with a batch of positions.
    pub fn with_positions(positions: impl IntoIterator<Item = StakingPosition>) -> Self {
        let ledger = Self::new();
        for position in positions {
            ledger.add_position(position);
        }
        ledger
    }

    /// Record a new stake lot for its owner.
    pub fn add_position(&self, position: StakingPosition) {
        self.positions
            .lock()
            .unwrap()
            .entry(position.owner.clone())
            .or_default()
            .push(position);
    }

    /// Number of `active_positions` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StakeReader for NullLedger {
    async fn active_positions(
        &self,
        address: &Address,
        as_of: Timestamp,
    ) -> Result<Vec<StakingPosition>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.faults.apply("ledger").await?;
        Ok(self
            .positions
            .lock()
            .unwrap()
            .get(address)
            .map(|lots| lots.iter().filter(|p| p.is_active(as_of)).cloned().collect())
            .unwrap_or_default())
    }
}
