//! Memcached cache store.

use super::{CacheStore, UpsertOptions};
use crate::entry::{CachedEntry, EntryMetadata};
use crate::error::{Error, Result};
use crate::request::QueryOptions;
use async_memcached::AsciiProtocol;
use deadpool_memcached::{Manager, Pool};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default Memcached connection pool size.
/// Override with MEMCACHED_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

/// Longest expiration memcached reads as relative seconds; anything larger
/// is taken as an absolute Unix timestamp.
const MAX_RELATIVE_EXPIRATION: u64 = 60 * 60 * 24 * 30;

/// Configuration for Memcached store.
#[derive(Clone, Debug)]
pub struct MemcachedConfig {
    pub servers: Vec<String>, // e.g., ["localhost:11211", "cache2:11211"]
    /// Limit on checking a connection out of the pool.
    pub connection_timeout: Duration,
    pub pool_size: u32,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        MemcachedConfig {
            servers: vec!["localhost:11211".to_string()],
            connection_timeout: Duration::from_secs(5),
            pool_size: 10,
        }
    }
}

/// What is actually written to memcached: the payload plus the expiry the
/// orchestrator checks, since memcached exposes no per-item metadata.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    payload: Vec<u8>,
    expires_ms: Option<u64>,
}

impl StoredEntry {
    fn into_entry(self) -> CachedEntry {
        let expires = self
            .expires_ms
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms));
        CachedEntry {
            payload: self.payload,
            metadata: Some(EntryMetadata { expires }),
        }
    }
}

fn epoch_millis(at: SystemTime) -> Option<u64> {
    at.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
}

/// Expiration field for a `set` with `ttl`, written at `now`.
///
/// Up to 30 days the TTL is sent as relative seconds (at least one). Longer
/// TTLs are sent as the absolute Unix time they end at. A TTL too large to
/// express becomes `0`, which memcached keeps until evicted.
fn expiration_for(ttl: Duration, now: SystemTime) -> i64 {
    let secs = ttl.as_secs();
    if secs <= MAX_RELATIVE_EXPIRATION {
        return i64::try_from(secs.max(1)).unwrap_or(0);
    }

    now.checked_add(ttl)
        .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| u32::try_from(d.as_secs()).ok())
        .map(i64::from)
        .unwrap_or(0)
}

/// Check a connection out of the pool, giving up after `limit`.
async fn checkout<T, E, Fut>(limit: Duration, get: Fut) -> Result<T>
where
    E: Display,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(limit, get).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(Error::BackendError(format!(
            "Failed to get Memcached connection: {}",
            e
        ))),
        Err(_) => Err(Error::Timeout(format!(
            "Memcached connection not available within {:?}",
            limit
        ))),
    }
}

/// Memcached store with connection pooling.
///
/// Memcached drops items on its own once their TTL has passed; the expiry is
/// also recorded inside the stored value so freshness can be evaluated the
/// same way as for any other store.
///
/// # Example
///
/// ```no_run
/// # use provider_pull::backend::{CacheStore, MemcachedConfig, MemcachedStore, UpsertOptions};
/// # use provider_pull::error::Result;
/// # use std::time::Duration;
/// # async fn example() -> Result<()> {
/// let config = MemcachedConfig {
///     servers: vec!["localhost:11211".to_string()],
///     ..Default::default()
/// };
///
/// let store = MemcachedStore::new(config).await?;
/// let options = UpsertOptions { ttl: Duration::from_secs(60) };
/// store.upsert("foo::data", b"value".to_vec(), options).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemcachedStore {
    pool: Pool,
    connection_timeout: Duration,
}

impl MemcachedStore {
    /// Create new Memcached store from configuration.
    ///
    /// # Errors
    /// Returns `Err` if connection pool creation fails
    pub async fn new(config: MemcachedConfig) -> Result<Self> {
        // deadpool-memcached Manager takes a single server address
        let addr = config
            .servers
            .first()
            .ok_or_else(|| Error::ConfigError("No memcached servers specified".to_string()))?
            .clone();

        let manager = Manager::new(addr.clone());

        let pool = Pool::builder(manager)
            .max_size(config.pool_size as usize)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Memcached store initialized with server: {} (pool size: {}, connection timeout: {:?})",
            addr, config.pool_size, config.connection_timeout
        );

        Ok(MemcachedStore {
            pool,
            connection_timeout: config.connection_timeout,
        })
    }

    /// Create from server address directly.
    ///
    /// Pool size comes from `MEMCACHED_POOL_SIZE` when set, `DEFAULT_POOL_SIZE`
    /// otherwise.
    ///
    /// # Errors
    /// Returns `Err` if connection pool creation fails
    pub async fn from_server(addr: String) -> Result<Self> {
        let pool_size = std::env::var("MEMCACHED_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        let config = MemcachedConfig {
            servers: vec![addr],
            pool_size,
            ..Default::default()
        };
        Self::new(config).await
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

impl CacheStore for MemcachedStore {
    async fn retrieve(&self, key: &str, _query: &QueryOptions) -> Result<Option<CachedEntry>> {
        let mut conn = checkout(self.connection_timeout, self.pool.get()).await?;

        match conn.get(key).await {
            Ok(Some(value)) => {
                debug!("✓ Memcached GET {} -> HIT", key);
                match value.data {
                    Some(bytes) => {
                        let stored: StoredEntry = postcard::from_bytes(&bytes)?;
                        Ok(Some(stored.into_entry()))
                    }
                    None => Ok(None),
                }
            }
            Ok(None) => {
                debug!("✓ Memcached GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(Error::BackendError(format!(
                "Memcached GET failed for key {}: {}",
                key, e
            ))),
        }
    }

    async fn upsert(&self, key: &str, payload: Vec<u8>, options: UpsertOptions) -> Result<()> {
        let stored = StoredEntry {
            payload,
            expires_ms: SystemTime::now()
                .checked_add(options.ttl)
                .and_then(epoch_millis),
        };
        let bytes = postcard::to_allocvec(&stored)
            .map_err(|e| Error::SerializationError(e.to_string()))?;

        let mut conn = checkout(self.connection_timeout, self.pool.get()).await?;

        let expiration = Some(expiration_for(options.ttl, SystemTime::now()));

        conn.set(key, bytes.as_slice(), expiration, None)
            .await
            .map_err(|e| {
                Error::BackendError(format!("Memcached SET failed for key {}: {}", key, e))
            })?;

        debug!("✓ Memcached SET {} (TTL: {:?})", key, options.ttl);
        Ok(())
    }
}
