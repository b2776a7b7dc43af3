//! Orchestrator configuration.
//!
//! Options come from two places: the host (builder or environment) and the
//! provider itself. Each field resolves as provider value, then host value,
//! then default.

use crate::error::{Error, Result};
use crate::freshness::FreshnessPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the per-stage timeout in milliseconds.
///
/// A non-zero value makes every pull use `tokio::time::timeout`, so pulls
/// must then run inside a Tokio runtime with time enabled.
pub const ENV_STAGE_TIMEOUT_MS: &str = "PULL_STAGE_TIMEOUT_MS";

/// Environment variable holding the freshness policy
/// (`permissive` or `require_expiry`).
pub const ENV_FRESHNESS: &str = "PULL_FRESHNESS";

/// Partial configuration; unset fields defer to the next source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderOptions {
    /// Limit for each of lookup, pre hook, fetch and post hook. `0` means no
    /// limit.
    ///
    /// A non-zero limit requires pulls to run inside a Tokio runtime with
    /// time enabled; outside one the timer panics.
    pub stage_timeout_ms: Option<u64>,
    pub freshness: Option<FreshnessPolicy>,
}

impl ProviderOptions {
    /// Read host options from the process environment.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let stage_timeout_ms = lookup(ENV_STAGE_TIMEOUT_MS)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    Error::ConfigError(format!("{} must be milliseconds: {}", ENV_STAGE_TIMEOUT_MS, e))
                })
            })
            .transpose()?;

        let freshness = lookup(ENV_FRESHNESS)
            .map(|raw| {
                serde_json::from_value::<FreshnessPolicy>(serde_json::Value::String(
                    raw.trim().to_string(),
                ))
                .map_err(|e| Error::ConfigError(format!("{} is invalid: {}", ENV_FRESHNESS, e)))
            })
            .transpose()?;

        Ok(ProviderOptions {
            stage_timeout_ms,
            freshness,
        })
    }

    /// Fill every unset field of `self` from `fallback`.
    pub fn or(self, fallback: &ProviderOptions) -> ProviderOptions {
        ProviderOptions {
            stage_timeout_ms: self.stage_timeout_ms.or(fallback.stage_timeout_ms),
            freshness: self.freshness.or(fallback.freshness),
        }
    }
}

/// Fully resolved configuration held by an orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// `None` means stages may run indefinitely.
    pub stage_timeout: Option<Duration>,
    pub freshness: FreshnessPolicy,
}

impl OrchestratorConfig {
    /// Resolve `provider` over `host` over defaults.
    pub fn resolve(provider: &ProviderOptions, host: &ProviderOptions) -> Self {
        let merged = provider.clone().or(host);
        OrchestratorConfig {
            stage_timeout: merged
                .stage_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            freshness: merged.freshness.unwrap_or_default(),
        }
    }
}
