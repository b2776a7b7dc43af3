//! Cache key derivation.

use crate::request::Request;
use std::fmt;

/// Separator between key tokens.
pub const KEY_SEPARATOR: &str = "::";

/// Resource kinds served by the orchestrator. Each gets its own key space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Primary data.
    Data,
    /// Layer description.
    Layer,
    /// Catalog listing.
    Catalog,
}

impl ResourceKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ResourceKind::Data => "data",
            ResourceKind::Layer => "layer",
            ResourceKind::Catalog => "catalog",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Builds cache keys from request routing attributes.
///
/// Key format: `"{route base}[::{host}][::{id}][::{layer}]::{kind}"`.
pub struct KeyDeriver;

impl KeyDeriver {
    /// Default base key for a request, without the kind suffix.
    ///
    /// Absent or empty parameters are skipped.
    pub fn base_key(request: &Request) -> String {
        let params = &request.params;
        let mut key = request.route_base().to_string();

        for token in [&params.host, &params.id, &params.layer]
            .into_iter()
            .flatten()
            .filter(|token| !token.is_empty())
        {
            key.push_str(KEY_SEPARATOR);
            key.push_str(token);
        }

        key
    }

    /// Append the kind suffix to a base key (default or provider override).
    pub fn with_kind(base: &str, kind: ResourceKind) -> String {
        format!("{}{}{}", base, KEY_SEPARATOR, kind.suffix())
    }

    /// Full default key for `request` and `kind`.
    pub fn derive(request: &Request, kind: ResourceKind) -> String {
        Self::with_kind(&Self::base_key(request), kind)
    }
}

/// Shorthand for [`KeyDeriver::derive`].
pub fn derive_key(request: &Request, kind: ResourceKind) -> String {
    KeyDeriver::derive(request, kind)
}
