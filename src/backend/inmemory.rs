//! In-process cache store.

use super::{CacheStore, UpsertOptions};
use crate::entry::{CachedEntry, EntryMetadata};
use crate::error::Result;
use crate::request::QueryOptions;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent in-memory store backed by `DashMap`.
///
/// Entries are never evicted; an expired entry stays until it is replaced.
///
/// # Example
///
/// ```
/// # use provider_pull::backend::{CacheStore, InMemoryStore, UpsertOptions};
/// # use provider_pull::request::QueryOptions;
/// # use std::time::Duration;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> provider_pull::Result<()> {
/// let store = InMemoryStore::new();
/// let options = UpsertOptions { ttl: Duration::from_secs(60) };
/// store.upsert("foo::data", b"payload".to_vec(), options).await?;
///
/// let entry = store.retrieve("foo::data", &QueryOptions::new()).await?;
/// assert!(entry.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, CachedEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an entry directly, bypassing TTL handling.
    pub fn put_entry(&self, key: impl Into<String>, entry: CachedEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Snapshot of the entry stored under `key`.
    pub fn entry(&self, key: &str) -> Option<CachedEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        debug!("✓ InMemory store cleared");
    }
}

impl CacheStore for InMemoryStore {
    async fn retrieve(&self, key: &str, _query: &QueryOptions) -> Result<Option<CachedEntry>> {
        let entry = self.entry(key);
        debug!(
            "InMemory RETRIEVE {} -> {}",
            key,
            if entry.is_some() { "HIT" } else { "MISS" }
        );
        Ok(entry)
    }

    async fn upsert(&self, key: &str, payload: Vec<u8>, options: UpsertOptions) -> Result<()> {
        let entry = CachedEntry {
            payload,
            metadata: Some(EntryMetadata::expiring_in(options.ttl)),
        };
        self.entries.insert(key.to_string(), entry);
        debug!("✓ InMemory UPSERT {} (TTL: {:?})", key, options.ttl);
        Ok(())
    }
}
