//! Trait implemented by everything a provider can return.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value produced by a fetch function and cached by the orchestrator.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use provider_pull::Resource;
/// use std::time::Duration;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct FeatureCollection {
///     pub name: String,
///     pub features: Vec<String>,
///     pub ttl_secs: Option<u64>,
/// }
///
/// impl Resource for FeatureCollection {
///     fn ttl(&self) -> Option<Duration> {
///         self.ttl_secs.map(Duration::from_secs)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone + 'static {
    /// How long the orchestrator should keep this value in the cache.
    ///
    /// `None` (the default) or a zero duration means the value is returned
    /// but never written back.
    fn ttl(&self) -> Option<Duration> {
        None
    }

    /// Encode for cache storage.
    ///
    /// See `crate::serialization` for the envelope layout.
    fn serialize_for_cache(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_for_cache(self)
    }

    /// Decode from cache storage.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheEntry`: Bad magic or truncated envelope
    /// - `Error::VersionMismatch`: Schema version changed
    /// - `Error::DeserializationError`: Corrupted payload
    fn deserialize_from_cache(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_from_cache(bytes)
    }
}

/// Generic fetch result: any serializable payload plus an optional TTL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    pub data: T,
    pub ttl: Option<Duration>,
}

impl<T> FetchResult<T> {
    /// Result that is returned but not cached.
    pub fn transient(data: T) -> Self {
        FetchResult { data, ttl: None }
    }

    /// Result cached for `ttl`.
    pub fn cached_for(data: T, ttl: Duration) -> Self {
        FetchResult {
            data,
            ttl: Some(ttl),
        }
    }
}

impl<T> Resource for FetchResult<T>
where
    T: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone + 'static,
{
    fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl Resource for String {}

impl<T: Resource> Resource for Vec<T> {
    /// Shortest TTL of the items, if every item has one.
    fn ttl(&self) -> Option<Duration> {
        self.iter().map(|item| item.ttl()).min().flatten()
    }
}
