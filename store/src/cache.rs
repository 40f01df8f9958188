//! Generic TTL key-value cache trait.

use crate::StoreError;
use async_trait::async_trait;

/// A byte-oriented key-value store with per-key expiry.
///
/// Satisfied by an in-memory map, an LRU, or a networked cache. Expired keys
/// must read as absent.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
