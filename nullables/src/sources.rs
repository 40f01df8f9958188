//! Nullable supply and participation sources.

use crate::Faults;
use async_trait::async_trait;
use civitas_store::{ParticipationScore, ParticipationSource, StoreError, SupplySource};
use std::collections::HashMap;
use std::sync::Mutex;

/// A fixed, settable total supply.
#[derive(Default)]
pub struct NullSupply {
    total: Mutex<u128>,
    pub faults: Faults,
}

impl NullSupply {
    pub fn new(total: u128) -> Self {
        let supply = Self::default();
        supply.set(total);
        supply
    }

    pub fn set(&self, total: u128) {
        *self.total.lock().unwrap() = total;
    }
}

#[async_trait]
impl SupplySource for NullSupply {
    async fn total_supply(&self) -> Result<u128, StoreError> {
        self.faults.apply("supply").await?;
        Ok(*self.total.lock().unwrap())
    }
}

/// Participation scores keyed by epoch.
#[derive(Default)]
pub struct NullParticipation {
    epochs: Mutex<HashMap<u64, Vec<ParticipationScore>>>,
    pub faults: Faults,
}

impl NullParticipation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scores(&self, epoch: u64, scores: Vec<ParticipationScore>) {
        self.epochs.lock().unwrap().insert(epoch, scores);
    }
}

#[async_trait]
impl ParticipationSource for NullParticipation {
    async fn scores(&self, epoch: u64) -> Result<Vec<ParticipationScore>, StoreError> {
        self.faults.apply("participation").await?;
        Ok(self
            .epochs
            .lock()
            .unwrap()
            .get(&epoch)
            .cloned()
            .unwrap_or_default())
    }
}
