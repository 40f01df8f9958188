//! Vote delegation: entrust voting power to a representative.
//!
//! Supports:
//! - **Transitive delegation** (A→B→C means A's stake is counted for C)
//! - **Cycle rejection** at write time and max-depth limits on every walk
//! - **Cache invalidation** of every address whose power an edge change affects
//!
//! Edges live in an injected [`DelegationStore`]; the registry adds the graph
//! rules and serializes writers.

use crate::cache::VotingPowerCache;
use crate::call::bounded;
use crate::error::DelegationError;
use crate::spans::delegation_span;
use crate::INTEGRITY_TARGET;
use civitas_store::DelegationStore;
use civitas_types::Address;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn, Instrument};

/// How an outgoing-chain walk stopped.
#[derive(Debug, PartialEq, Eq)]
enum WalkEnd {
    /// Reached an address with no outgoing edge.
    Root,
    /// Came back to an address already on the chain.
    Cycle,
    TooDeep,
}

/// Manages delegation edges on top of a [`DelegationStore`].
pub struct DelegationRegistry {
    store: Arc<dyn DelegationStore>,
    cache: Arc<VotingPowerCache>,
    max_depth: usize,
    timeout: Duration,
    /// One writer at a time; reads never take it.
    writer: Mutex<()>,
}

impl DelegationRegistry {
    pub fn new(
        store: Arc<dyn DelegationStore>,
        cache: Arc<VotingPowerCache>,
        max_depth: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            max_depth,
            timeout,
            writer: Mutex::new(()),
        }
    }

    /// Set or replace `from`'s delegation.
    ///
    /// All reads happen before the write, so a rejection or a store failure
    /// leaves the graph untouched.
    pub async fn delegate(&self, from: &Address, to: &Address) -> Result<(), DelegationError> {
        if from == to {
            return Err(DelegationError::SelfDelegation);
        }
        let span = delegation_span(from, Some(to));
        async {
            let _guard = self.writer.lock().await;

            let (new_chain, end) = self.walk(to).await?;
            if new_chain.contains(from) {
                return Err(DelegationError::CyclicDelegation {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            match end {
                WalkEnd::Root => {}
                WalkEnd::TooDeep => return Err(DelegationError::ChainTooDeep(to.clone())),
                WalkEnd::Cycle => {
                    warn!(target: INTEGRITY_TARGET, %to, "existing delegation chain loops");
                    return Err(DelegationError::CorruptGraph(to.clone()));
                }
            }

            // Longest resulting path: deepest delegator into `from`, the new edge,
            // then `to`'s outgoing hops.
            let (upstream, height) = self.upstream(from).await?;
            if height + new_chain.len() > self.max_depth {
                return Err(DelegationError::ChainTooDeep(from.clone()));
            }
            let old_chain = match bounded(self.timeout, "delegation", self.store.get_delegate(from)).await? {
                Some(old) if &old != to => self.walk(&old).await?.0,
                _ => Vec::new(),
            };

            let previous = bounded(self.timeout, "delegation", self.store.put_delegation(from, to)).await?;
            info!(%from, %to, previous = ?previous, "delegation set");

            let mut affected: BTreeSet<&Address> = BTreeSet::new();
            affected.insert(from);
            affected.extend(&upstream);
            affected.extend(&old_chain);
            affected.extend(&new_chain);
            self.cache.invalidate_all(affected).await;
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Remove `from`'s delegation. A no-op when there is none.
    pub async fn undelegate(&self, from: &Address) -> Result<(), DelegationError> {
        let span = delegation_span(from, None);
        async {
            let _guard = self.writer.lock().await;

            let Some(current) = bounded(self.timeout, "delegation", self.store.get_delegate(from)).await? else {
                debug!(%from, "undelegate without delegation");
                return Ok(());
            };
            let (upstream, _) = self.upstream(from).await?;
            let (old_chain, _) = self.walk(&current).await?;

            bounded(self.timeout, "delegation", self.store.remove_delegation(from)).await?;
            info!(%from, previous = %current, "delegation removed");

            let mut affected: BTreeSet<&Address> = BTreeSet::new();
            affected.insert(from);
            affected.extend(&upstream);
            affected.extend(&old_chain);
            self.cache.invalidate_all(affected).await;
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// The direct delegate of `address` (None if not delegated).
    pub async fn get_delegate(&self, address: &Address) -> Result<Option<Address>, DelegationError> {
        Ok(bounded(self.timeout, "delegation", self.store.get_delegate(address)).await?)
    }

    /// Addresses that delegate directly to `address`.
    pub async fn get_delegators(&self, address: &Address) -> Result<BTreeSet<Address>, DelegationError> {
        Ok(bounded(self.timeout, "delegation", self.store.get_delegators(address)).await?)
    }

    /// Resolve the final delegate for `from` by following its outgoing chain.
    /// Returns None if the chain loops or exceeds the maximum depth.
    pub async fn resolve(&self, from: &Address) -> Result<Option<Address>, DelegationError> {
        let (chain, end) = self.walk(from).await?;
        Ok(match end {
            WalkEnd::Root => chain.last().cloned(),
            WalkEnd::Cycle | WalkEnd::TooDeep => None,
        })
    }

    /// Addresses on the outgoing chain starting at `start` (inclusive).
    async fn walk(&self, start: &Address) -> Result<(Vec<Address>, WalkEnd), DelegationError> {
        let mut chain = vec![start.clone()];
        let mut seen = HashSet::from([start.clone()]);
        let mut current = start.clone();
        for _ in 0..self.max_depth {
            match bounded(self.timeout, "delegation", self.store.get_delegate(&current)).await? {
                None => return Ok((chain, WalkEnd::Root)),
                Some(next) => {
                    if !seen.insert(next.clone()) {
                        chain.push(next);
                        return Ok((chain, WalkEnd::Cycle));
                    }
                    chain.push(next.clone());
                    current = next;
                }
            }
        }
        Ok((chain, WalkEnd::TooDeep))
    }

    /// Every address delegating into `root`, directly or transitively, and the
    /// number of hops from the farthest of them (walk capped at the maximum depth).
    async fn upstream(&self, root: &Address) -> Result<(BTreeSet<Address>, usize), DelegationError> {
        let mut found = BTreeSet::new();
        let mut frontier = vec![root.clone()];
        let mut height = 0;
        for _ in 0..self.max_depth {
            let mut next = Vec::new();
            for node in frontier {
                for delegator in bounded(self.timeout, "delegation", self.store.get_delegators(&node)).await? {
                    if &delegator != root && found.insert(delegator.clone()) {
                        next.push(delegator);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            height += 1;
            frontier = next;
        }
        Ok((found, height))
    }
}
