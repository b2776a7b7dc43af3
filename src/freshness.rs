//! Freshness evaluation for cached entries.
//!
//! Under the default [`FreshnessPolicy::Permissive`] policy an entry with no
//! expiry never goes stale. Stores (and the fetch functions feeding them) that
//! rely on TTL invalidation must always record an expiry, otherwise the entry
//! is served forever.

use crate::entry::CachedEntry;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// How entries without an expiry are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessPolicy {
    /// Missing expiry means fresh.
    #[default]
    Permissive,
    /// Missing expiry means stale.
    RequireExpiry,
}

impl FreshnessPolicy {
    pub fn is_fresh_at(&self, entry: Option<&CachedEntry>, now: SystemTime) -> bool {
        match (self, entry.and_then(CachedEntry::expires)) {
            (_, Some(expires)) => now < expires,
            (FreshnessPolicy::Permissive, None) => true,
            (FreshnessPolicy::RequireExpiry, None) => entry.is_none(),
        }
    }

    pub fn is_fresh(&self, entry: Option<&CachedEntry>) -> bool {
        self.is_fresh_at(entry, SystemTime::now())
    }
}

/// Permissive freshness check against the current time.
///
/// Absent entries and entries without an expiry are fresh; otherwise the
/// entry is fresh iff now is strictly before its expiry.
pub fn is_fresh(entry: Option<&CachedEntry>) -> bool {
    FreshnessPolicy::Permissive.is_fresh(entry)
}

/// Permissive freshness check against `now`.
pub fn is_fresh_at(entry: Option<&CachedEntry>, now: SystemTime) -> bool {
    FreshnessPolicy::Permissive.is_fresh_at(entry, now)
}
