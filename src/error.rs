//! Error types for cache orchestration.

use thiserror::Error;

/// Errors produced by the orchestrator, its stores and its collaborators.
///
/// Only [`Error::Unsupported`], [`Error::Timeout`] and the errors returned by
/// hooks and fetch functions ever reach the caller of a pull operation.
/// Store errors raised during lookup or write-back are absorbed.
#[derive(Error, Debug)]
pub enum Error {
    /// The provider does not expose the capability needed by the operation.
    #[error("{operation}() is not implemented in the provider")]
    Unsupported { operation: &'static str },

    /// A pre- or post-fetch hook rejected the request.
    #[error("Hook aborted: {0}")]
    HookAborted(String),

    /// The provider failed to produce the resource.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Cache store is unavailable or the operation failed.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A stage did not complete within the configured limit.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Value could not be encoded for the cache.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Cached bytes could not be decoded.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Cached bytes are not a valid envelope (bad magic or truncated).
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    /// Cached envelope was written by a different schema version.
    #[error("Cache schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::DeserializationError(e.to_string())
    }
}
