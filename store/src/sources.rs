//! Read-only data sources refreshed outside the engine.

use crate::StoreError;
use async_trait::async_trait;
use civitas_types::Address;
use serde::{Deserialize, Serialize};

/// Reports the current total token supply.
#[async_trait]
pub trait SupplySource: Send + Sync {
    async fn total_supply(&self) -> Result<u128, StoreError>;
}

/// One participant's accrued score for an epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationScore {
    pub address: Address,
    pub score: u128,
}

/// Provides participation scores accrued during an epoch.
#[async_trait]
pub trait ParticipationSource: Send + Sync {
    async fn scores(&self, epoch: u64) -> Result<Vec<ParticipationScore>, StoreError>;
}
