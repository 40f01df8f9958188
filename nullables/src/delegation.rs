//! Nullable delegation store: in-memory edge map with reverse index.

use crate::Faults;
use async_trait::async_trait;
use civitas_store::{DelegationStore, StoreError};
use civitas_types::Address;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct Edges {
    /// delegator → delegate.
    forward: HashMap<Address, Address>,
    /// delegate → direct delegators.
    reverse: HashMap<Address, BTreeSet<Address>>,
}

impl Edges {
    fn unlink(&mut self, from: &Address) -> Option<Address> {
        let old_to = self.forward.remove(from)?;
        if let Some(set) = self.reverse.get_mut(&old_to) {
            set.remove(from);
            if set.is_empty() {
                self.reverse.remove(&old_to);
            }
        }
        Some(old_to)
    }
}

/// An in-memory delegation store for testing.
///
/// Stores edges verbatim; it does not reject self-delegation or cycles, which
/// lets tests seed corrupted graphs.
#[derive(Default)]
pub struct NullDelegationStore {
    edges: Mutex<Edges>,
    pub faults: Faults,
}

impl NullDelegationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge directly, bypassing any graph rules.
    pub fn seed(&self, from: &Address, to: &Address) {
        let mut edges = self.edges.lock().unwrap();
        edges.unlink(from);
        edges.forward.insert(from.clone(), to.clone());
        edges.reverse.entry(to.clone()).or_default().insert(from.clone());
    }
}

#[async_trait]
impl DelegationStore for NullDelegationStore {
    async fn put_delegation(
        &self,
        from: &Address,
        to: &Address,
    ) -> Result<Option<Address>, StoreError> {
        self.faults.apply("delegation").await?;
        let mut edges = self.edges.lock().unwrap();
        let previous = edges.unlink(from);
        edges.forward.insert(from.clone(), to.clone());
        edges.reverse.entry(to.clone()).or_default().insert(from.clone());
        Ok(previous)
    }

    async fn remove_delegation(&self, from: &Address) -> Result<Option<Address>, StoreError> {
        self.faults.apply("delegation").await?;
        Ok(self.edges.lock().unwrap().unlink(from))
    }

    async fn get_delegate(&self, address: &Address) -> Result<Option<Address>, StoreError> {
        self.faults.apply("delegation").await?;
        Ok(self.edges.lock().unwrap().forward.get(address).cloned())
    }

    async fn get_delegators(&self, address: &Address) -> Result<BTreeSet<Address>, StoreError> {
        self.faults.apply("delegation").await?;
        Ok(self
            .edges
            .lock()
            .unwrap()
            .reverse
            .get(address)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    #[tokio::test]
    async fn replace_updates_reverse_index() {
        let store = NullDelegationStore::new();
        assert_eq!(store.put_delegation(&addr("a"), &addr("b")).await.unwrap(), None);
        assert_eq!(
            store.put_delegation(&addr("a"), &addr("c")).await.unwrap(),
            Some(addr("b"))
        );
        assert!(store.get_delegators(&addr("b")).await.unwrap().is_empty());
        assert_eq!(
            store.get_delegators(&addr("c")).await.unwrap(),
            BTreeSet::from([addr("a")])
        );
    }

    #[tokio::test]
    async fn remove_returns_old_target() {
        let store = NullDelegationStore::new();
        store.put_delegation(&addr("a"), &addr("b")).await.unwrap();
        assert_eq!(store.remove_delegation(&addr("a")).await.unwrap(), Some(addr("b")));
        assert_eq!(store.remove_delegation(&addr("a")).await.unwrap(), None);
        assert_eq!(store.get_delegate(&addr("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn seed_allows_cycles() {
        let store = NullDelegationStore::new();
        store.seed(&addr("a"), &addr("b"));
        store.seed(&addr("b"), &addr("a"));
        assert_eq!(store.get_delegate(&addr("b")).await.unwrap(), Some(addr("a")));
    }
}
