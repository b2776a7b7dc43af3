//! Entries as returned by a cache store.

use std::time::{Duration, SystemTime};

/// Store-owned metadata attached to a cached payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Instant after which the entry is stale.
    pub expires: Option<SystemTime>,
}

impl EntryMetadata {
    /// Metadata expiring `ttl` from now.
    pub fn expiring_in(ttl: Duration) -> Self {
        EntryMetadata {
            expires: SystemTime::now().checked_add(ttl),
        }
    }
}

/// A cached payload plus optional metadata.
///
/// The payload is opaque to the store; the orchestrator decodes it with
/// [`crate::Resource::deserialize_from_cache`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedEntry {
    pub payload: Vec<u8>,
    pub metadata: Option<EntryMetadata>,
}

impl CachedEntry {
    /// Entry without metadata.
    pub fn new(payload: Vec<u8>) -> Self {
        CachedEntry {
            payload,
            metadata: None,
        }
    }

    /// Entry expiring at `expires`.
    pub fn with_expiry(payload: Vec<u8>, expires: SystemTime) -> Self {
        CachedEntry {
            payload,
            metadata: Some(EntryMetadata {
                expires: Some(expires),
            }),
        }
    }

    pub fn expires(&self) -> Option<SystemTime> {
        self.metadata.as_ref().and_then(|m| m.expires)
    }
}
