//! Version-stamped voting-power cache over an injected [`KvCache`].
//!
//! Every address carries a monotonically increasing version. Invalidation bumps
//! the version before deleting the key, and every published entry is stamped
//! with the version its computation started from. This gives two guarantees:
//!
//! - a computation that raced with an invalidation cannot publish: [`VotingPowerCache::publish`]
//!   refuses a stale stamp, and if the invalidation lands mid-write it deletes the key
//!   again (second invalidation pass);
//! - an entry that slipped through anyway (failed delete, late write) is rejected on
//!   read because its stamp no longer matches.

use crate::call::bounded;
use crate::{GovernanceError, INTEGRITY_TARGET};
use civitas_store::{KvCache, StoreError};
use civitas_types::{Address, VotingPower};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    /// The entry or the publish was overtaken by an invalidation.
    #[error("cache entry for {0} is stale")]
    Stale(Address),

    #[error("cache backend error: {0}")]
    Store(#[from] StoreError),

    #[error("cache did not answer in time")]
    Timeout,

    #[error("cache codec error: {0}")]
    Codec(String),
}

impl From<GovernanceError> for CacheError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Store(e) => Self::Store(e),
            GovernanceError::Cache(e) => e,
            _ => Self::Timeout,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Stamped {
    version: u64,
    power: VotingPower,
}

/// Addresses tracked before the version table is collapsed.
pub const DEFAULT_TRACKED_VERSIONS: usize = 65_536;

/// Per-address versions drawn from one global counter.
///
/// Untracked addresses read as `floor`. Collapsing drops every entry and raises
/// `floor` to the counter, so no version ever goes backwards.
#[derive(Default)]
struct Versions {
    by_address: HashMap<Address, u64>,
    counter: u64,
    floor: u64,
}

/// Address → [`VotingPower`] cache with TTL expiry and versioned invalidation.
///
/// The version table holds at most `version_limit` addresses. When it would grow
/// past that it collapses, which makes every entry written before then read as
/// stale once.
pub struct VotingPowerCache {
    kv: Arc<dyn KvCache>,
    ttl_secs: u64,
    timeout: Duration,
    version_limit: usize,
    versions: Mutex<Versions>,
}

impl VotingPowerCache {
    pub fn new(kv: Arc<dyn KvCache>, ttl_secs: u64, timeout: Duration) -> Self {
        Self {
            kv,
            ttl_secs,
            timeout,
            version_limit: DEFAULT_TRACKED_VERSIONS,
            versions: Mutex::new(Versions::default()),
        }
    }

    /// Cap the number of addresses whose version is tracked individually.
    pub fn with_version_limit(mut self, limit: usize) -> Self {
        self.version_limit = limit.max(1);
        self
    }

    /// Key under which `address`'s power is stored.
    pub fn key(address: &Address) -> String {
        format!("voting_power:{address}")
    }

    /// Current version stamp of `address`. Snapshot this before reading any data
    /// a computation depends on.
    pub fn version(&self, address: &Address) -> u64 {
        let versions = self.versions();
        versions.by_address.get(address).copied().unwrap_or(versions.floor)
    }

    /// Number of addresses with an individually tracked version.
    pub fn tracked_versions(&self) -> usize {
        self.versions().by_address.len()
    }

    fn bump(&self, address: &Address) -> u64 {
        let mut versions = self.versions();
        if versions.by_address.len() >= self.version_limit && !versions.by_address.contains_key(address) {
            debug!(tracked = versions.by_address.len(), "version table collapsed");
            versions.floor = versions.counter;
            versions.by_address.clear();
        }
        versions.counter += 1;
        let v = versions.counter;
        versions.by_address.insert(address.clone(), v);
        v
    }

    fn versions(&self) -> MutexGuard<'_, Versions> {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh entry for `address`, if any.
    ///
    /// Returns [`CacheError::Stale`] (after deleting the entry) when the stored
    /// stamp does not match the current version. Undecodable entries are deleted
    /// and read as a miss.
    pub async fn get(&self, address: &Address) -> Result<Option<VotingPower>, CacheError> {
        let key = Self::key(address);
        let Some(bytes) = bounded(self.timeout, "cache", self.kv.get(&key)).await? else {
            return Ok(None);
        };
        let stamped: Stamped = match bincode::deserialize(&bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(target: INTEGRITY_TARGET, %address, error = %e, "undecodable cache entry dropped");
                bounded(self.timeout, "cache", self.kv.delete(&key)).await?;
                return Ok(None);
            }
        };
        if stamped.version != self.version(address) || stamped.power.address != *address {
            warn!(
                target: INTEGRITY_TARGET,
                %address,
                stored = stamped.version,
                current = self.version(address),
                "stale voting power read after invalidation"
            );
            bounded(self.timeout, "cache", self.kv.delete(&key)).await?;
            return Err(CacheError::Stale(address.clone()));
        }
        debug!(%address, "voting power cache hit");
        Ok(Some(stamped.power))
    }

    /// Publish `power` computed from data read at `version`.
    ///
    /// Refuses to write if `address` was invalidated since `version` was taken,
    /// and undoes the write if an invalidation lands while it is in flight.
    pub async fn publish(&self, power: &VotingPower, version: u64) -> Result<(), CacheError> {
        let address = &power.address;
        if self.version(address) != version {
            return Err(CacheError::Stale(address.clone()));
        }
        let bytes = bincode::serialize(&Stamped {
            version,
            power: power.clone(),
        })
        .map_err(|e| CacheError::Codec(e.to_string()))?;
        let key = Self::key(address);
        let written = bounded(self.timeout, "cache", self.kv.set(&key, bytes, self.ttl_secs)).await;
        if self.version(address) != version {
            // Invalidated mid-write: whatever landed must go.
            bounded(self.timeout, "cache", self.kv.delete(&key)).await?;
            return Err(CacheError::Stale(address.clone()));
        }
        written?;
        Ok(())
    }

    /// Drop `address`'s entry. The version bump happens first and cannot fail,
    /// so even if the delete does, the old entry is never served again.
    pub async fn invalidate(&self, address: &Address) -> Result<(), CacheError> {
        let version = self.bump(address);
        debug!(%address, version, "voting power invalidated");
        bounded(self.timeout, "cache", self.kv.delete(&Self::key(address))).await?;
        Ok(())
    }

    /// Invalidate every address in `addresses`, logging rather than failing on
    /// backend errors.
    pub async fn invalidate_all<'a>(&self, addresses: impl IntoIterator<Item = &'a Address>) {
        for address in addresses {
            if let Err(e) = self.invalidate(address).await {
                warn!(%address, error = %e, "cache delete failed; entry fenced by version");
            }
        }
    }
}
