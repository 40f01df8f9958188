//! Vote history storage trait.

use crate::StoreError;
use async_trait::async_trait;
use civitas_types::{Address, ProposalId, VoteRecord};

/// Append-only vote history, bounded per address.
#[async_trait]
pub trait VoteHistoryStore: Send + Sync {
    /// Append `record` and trim the address's history to the newest `retention` entries.
    ///
    /// The has-voted index is not subject to `retention`.
    async fn append(&self, record: VoteRecord, retention: usize) -> Result<(), StoreError>;

    /// History for `address`, most recent first.
    async fn history(&self, address: &Address) -> Result<Vec<VoteRecord>, StoreError>;

    /// Whether `address` has ever voted on `proposal`.
    async fn has_voted(&self, address: &Address, proposal: &ProposalId) -> Result<bool, StoreError>;
}
