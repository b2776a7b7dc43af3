//! Metrics hooks for cache operations.

use std::time::Duration;

/// Receives one event per pull.
///
/// A fresh cache hit records a hit; a successful fetch after a miss or stale
/// entry records a miss; a failed pull records an error. Write-back outcomes
/// are not reported. Every method defaults to doing nothing.
pub trait CacheMetrics: Send + Sync {
    fn record_hit(&self, _key: &str, _duration: Duration) {}

    fn record_miss(&self, _key: &str, _duration: Duration) {}

    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}
