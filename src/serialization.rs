//! Versioned envelope for cached payloads.
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: u32 LE] [POSTCARD PAYLOAD]
//! ```
//!
//! Postcard is not self-describing: resources cached through this envelope
//! must not contain `serde_json::Value` or other `deserialize_any` types.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Envelope magic.
pub const CACHE_MAGIC: [u8; 4] = *b"PULL";

/// Bump when the layout of cached resources changes incompatibly.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let body = postcard::to_allocvec(value)
        .map_err(|e| Error::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(&CACHE_MAGIC);
    bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "envelope too short: {} bytes",
            bytes.len()
        )));
    }

    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[..4] != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry("bad magic".to_string()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..]);
    let found = u32::from_le_bytes(version);
    if found != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found,
        });
    }

    Ok(postcard::from_bytes(body)?)
}
