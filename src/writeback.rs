//! Deferred cache write-back.

use crate::backend::{CacheStore, UpsertOptions};
use crate::error::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::time::Duration;

/// A cache write prepared after a successful fetch but not yet attempted.
///
/// Dropping it skips the write.
pub struct PendingWrite {
    key: String,
    ttl: Duration,
    write: BoxFuture<'static, Result<()>>,
}

impl PendingWrite {
    pub(crate) fn new<S: CacheStore>(store: S, key: String, payload: Vec<u8>, ttl: Duration) -> Self {
        let write_key = key.clone();
        let write = async move {
            store
                .upsert(&write_key, payload, UpsertOptions { ttl })
                .await
        }
        .boxed();

        PendingWrite { key, ttl, write }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Perform the write on the current task and report its outcome.
    pub async fn commit(self) -> Result<()> {
        self.write.await
    }

    /// Perform the write in the background; failures are only logged at
    /// debug level.
    ///
    /// Uses the current Tokio runtime when there is one. Otherwise the write
    /// runs on a new thread driving its own current-thread runtime, so stores
    /// built on Tokio I/O or timers still work. That costs one thread per
    /// write; hosts without Tokio issuing many writes should drive
    /// [`PendingWrite::commit`] themselves.
    pub fn spawn(self) {
        let PendingWrite { key, write, .. } = self;
        let task = async move {
            match write.await {
                Ok(()) => debug!("✓ Write-back stored {}", key),
                Err(e) => debug!("✗ Write-back dropped for {}: {}", key, e),
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                std::thread::spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime.block_on(task),
                        Err(e) => debug!("✗ Write-back dropped, no runtime available: {}", e),
                    }
                });
            }
        }
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Outcome of a deferred pull: the value plus the write-back it calls for.
#[derive(Debug)]
pub struct Pulled<T> {
    pub value: T,
    /// `true` when the value was served from a fresh cache entry.
    pub from_cache: bool,
    /// Set only after a fetch whose result carries a non-zero TTL.
    pub write_back: Option<PendingWrite>,
}

impl<T> Pulled<T> {
    pub(crate) fn cached(value: T) -> Self {
        Pulled {
            value,
            from_cache: true,
            write_back: None,
        }
    }

    pub(crate) fn fetched(value: T, write_back: Option<PendingWrite>) -> Self {
        Pulled {
            value,
            from_cache: false,
            write_back,
        }
    }

    /// Hand off the pending write (if any) with [`PendingWrite::spawn`] and
    /// return the value without waiting for it.
    pub fn dispatch(self) -> T {
        if let Some(write) = self.write_back {
            write.spawn();
        }
        self.value
    }
}
