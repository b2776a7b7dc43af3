//! # provider-pull
//!
//! Read-through cache orchestration for pluggable data providers.
//!
//! A [`CacheOrchestrator`] sits between a host and a [`Provider`]. For each
//! request it derives a cache key, serves a fresh entry from the
//! [`CacheStore`] when there is one, and otherwise fetches from the provider
//! (through optional pre/post hooks for primary data), returns the value, and
//! writes it back with the TTL the value carries.
//!
//! ## Features
//!
//! - **Three resource kinds:** primary data, layers and catalogs, each in its own key space
//! - **Capabilities:** layer and catalog fetching are optional and checked explicitly
//! - **Hooks:** pre hook may veto a fetch, post hook may rewrite the result
//! - **Store agnostic:** in-memory store included, Memcached behind the `memcached` feature
//! - **Executor agnostic:** write-back can be spawned or driven by the caller
//!
//! ## Quick Start
//!
//! ```ignore
//! use provider_pull::{
//!     backend::InMemoryStore, CacheOrchestrator, FetchResult, Provider, Request, Result,
//! };
//! use std::time::Duration;
//!
//! // 1. Implement a provider
//! struct Parcels;
//!
//! impl Provider for Parcels {
//!     type Output = FetchResult<Vec<String>>;
//!
//!     async fn get_data(&self, request: &Request) -> Result<Self::Output> {
//!         let parcels = load_parcels(request.params.id.as_deref()).await?;
//!         Ok(FetchResult::cached_for(parcels, Duration::from_secs(300)))
//!     }
//! }
//!
//! // 2. Put a cache in front of it
//! let cache = CacheOrchestrator::new(Parcels, InMemoryStore::new());
//!
//! // 3. Pull
//! let request = Request::new("/parcels/FeatureServer/0").with_id("42");
//! let parcels = cache.pull(&request).await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod config;
pub mod entry;
pub mod error;
pub mod freshness;
pub mod hooks;
pub mod key;
pub mod observability;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod request;
pub mod resource;
pub mod serialization;
pub mod writeback;

// Re-exports for convenience
pub use backend::CacheStore;
pub use builder::OrchestratorBuilder;
pub use config::{OrchestratorConfig, ProviderOptions};
pub use entry::{CachedEntry, EntryMetadata};
pub use error::{Error, Result};
pub use freshness::{is_fresh, FreshnessPolicy};
pub use hooks::{Identity, PassThrough, PostHook, PreHook};
pub use key::{derive_key, ResourceKind};
pub use orchestrator::CacheOrchestrator;
pub use pipeline::run_with_hooks;
pub use provider::{Capabilities, Provider};
pub use request::{QueryOptions, Request};
pub use resource::{FetchResult, Resource};
pub use writeback::{PendingWrite, Pulled};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
