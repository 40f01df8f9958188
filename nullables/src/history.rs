//! Nullable vote history: bounded per-address lists plus a has-voted index.

use crate::Faults;
use async_trait::async_trait;
use civitas_store::{StoreError, VoteHistoryStore};
use civitas_types::{Address, ProposalId, VoteRecord};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// Newest first.
    by_address: HashMap<Address, VecDeque<VoteRecord>>,
    voted: HashSet<(Address, ProposalId)>,
}

/// An in-memory vote history store for testing.
#[derive(Default)]
pub struct NullHistoryStore {
    inner: Mutex<Inner>,
    pub faults: Faults,
}

impl NullHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteHistoryStore for NullHistoryStore {
    async fn append(&self, record: VoteRecord, retention: usize) -> Result<(), StoreError> {
        self.faults.apply("history").await?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .voted
            .insert((record.address.clone(), record.proposal_id.clone()));
        let list = inner.by_address.entry(record.address.clone()).or_default();
        list.push_front(record);
        list.truncate(retention);
        Ok(())
    }

    async fn history(&self, address: &Address) -> Result<Vec<VoteRecord>, StoreError> {
        self.faults.apply("history").await?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .by_address
            .get(address)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn has_voted(&self, address: &Address, proposal: &ProposalId) -> Result<bool, StoreError> {
        self.faults.apply("history").await?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .voted
            .contains(&(address.clone(), proposal.clone())))
    }
}
