//! Cache store interface and implementations.
//!
//! The orchestrator never evicts or sizes anything: stores own entry
//! lifetime, record expiry metadata from the TTL handed to `upsert`, and
//! provide their own concurrency safety.

use crate::entry::CachedEntry;
use crate::error::Result;
use crate::request::QueryOptions;
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "memcached")]
mod memcached;
#[cfg(feature = "memcached")]
pub use memcached::{MemcachedConfig, MemcachedStore};

/// Options for [`CacheStore::upsert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpsertOptions {
    pub ttl: Duration,
}

/// Backing cache used by the orchestrator.
///
/// Implementations are cheap handles (`Clone`) so a write-back can be
/// dispatched after the orchestrating call has returned.
pub trait CacheStore: Clone + Send + Sync + 'static {
    /// Look up `key`. `query` is the request's options bag; stores may use
    /// it to select a variant of the cached value.
    ///
    /// Expired entries are returned as-is; staleness is decided by the caller.
    fn retrieve(
        &self,
        key: &str,
        query: &QueryOptions,
    ) -> impl Future<Output = Result<Option<CachedEntry>>> + Send;

    /// Insert or replace `key`, recording an expiry `options.ttl` from now.
    fn upsert(
        &self,
        key: &str,
        payload: Vec<u8>,
        options: UpsertOptions,
    ) -> impl Future<Output = Result<()>> + Send;
}
