//! Delegation persistence trait.

use crate::StoreError;
use async_trait::async_trait;
use civitas_types::Address;
use std::collections::BTreeSet;

/// Durable "who delegates to whom" relation.
///
/// Single-delegate model: at most one outgoing edge per address. Graph rules
/// (self and cycle rejection) are enforced above this trait; implementations
/// only store edges and keep the reverse index consistent.
#[async_trait]
pub trait DelegationStore: Send + Sync {
    /// Insert or replace the outgoing edge of `from`. Returns the previous target.
    async fn put_delegation(
        &self,
        from: &Address,
        to: &Address,
    ) -> Result<Option<Address>, StoreError>;

    /// Remove the outgoing edge of `from`. Returns the removed target, if any.
    async fn remove_delegation(&self, from: &Address) -> Result<Option<Address>, StoreError>;

    /// The direct delegate of `address`.
    async fn get_delegate(&self, address: &Address) -> Result<Option<Address>, StoreError>;

    /// Addresses whose outgoing edge points at `address`.
    async fn get_delegators(&self, address: &Address) -> Result<BTreeSet<Address>, StoreError>;
}
