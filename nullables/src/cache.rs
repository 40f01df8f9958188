//! Nullable cache: in-memory TTL key-value store driven by an injected clock.

use crate::Faults;
use async_trait::async_trait;
use civitas_store::{KvCache, StoreError};
use civitas_types::{Clock, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

/// An in-memory TTL cache for testing and single-process deployments.
///
/// Entries expire when the injected clock reaches `inserted_at + ttl`.
pub struct NullCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Timestamp)>>,
    clock: Arc<dyn Clock>,
    pub faults: Faults,
}

impl NullCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            faults: Faults::default(),
        }
    }

    /// Whether a live (unexpired) entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(_, expires)| now < *expires)
    }

    /// Overwrite the raw bytes stored under `key`, keeping its expiry.
    pub fn corrupt(&self, key: &str, bytes: Vec<u8>) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.0 = bytes;
        }
    }
}

#[async_trait]
impl KvCache for NullCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.faults.apply("cache").await?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if now < *expires => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), StoreError> {
        self.faults.apply("cache").await?;
        let expires = Timestamp::new(self.clock.now().as_secs().saturating_add(ttl_secs));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.faults.apply("cache").await?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
