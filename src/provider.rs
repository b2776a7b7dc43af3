//! Provider interface: the fetch functions behind the cache.

use crate::config::ProviderOptions;
use crate::error::{Error, Result};
use crate::key::ResourceKind;
use crate::request::Request;
use crate::resource::Resource;
use std::future::{ready, Future};

/// Optional fetch capabilities a provider exposes beyond primary data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub layer: bool,
    pub catalog: bool,
}

impl Capabilities {
    /// Primary data only.
    pub const NONE: Capabilities = Capabilities {
        layer: false,
        catalog: false,
    };

    pub const fn with_layer(mut self) -> Self {
        self.layer = true;
        self
    }

    pub const fn with_catalog(mut self) -> Self {
        self.catalog = true;
        self
    }

    /// Whether resources of `kind` can be fetched. Primary data always can.
    pub fn supports(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Data => true,
            ResourceKind::Layer => self.layer,
            ResourceKind::Catalog => self.catalog,
        }
    }
}

/// Source of the authoritative data behind the cache.
///
/// Only [`Provider::get_data`] is required. A provider that can also
/// produce layers or catalogs overrides [`Provider::capabilities`] and the
/// matching fetch method; the orchestrator checks the capability before
/// calling it.
///
/// # Example
///
/// ```
/// use provider_pull::{FetchResult, Provider, Request, Result};
/// use std::time::Duration;
///
/// struct Static;
///
/// impl Provider for Static {
///     type Output = FetchResult<String>;
///
///     async fn get_data(&self, request: &Request) -> Result<Self::Output> {
///         let body = format!("features for {}", request.route_base());
///         Ok(FetchResult::cached_for(body, Duration::from_secs(60)))
///     }
/// }
/// ```
pub trait Provider: Send + Sync + 'static {
    type Output: Resource;

    /// Fetch primary data for `request`.
    fn get_data(&self, request: &Request) -> impl Future<Output = Result<Self::Output>> + Send;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Fetch the layer description. Only called when `capabilities().layer`.
    fn get_layer(&self, _request: &Request) -> impl Future<Output = Result<Self::Output>> + Send {
        ready(Err(Error::Unsupported {
            operation: "get_layer",
        }))
    }

    /// Fetch the catalog. Only called when `capabilities().catalog`.
    fn get_catalog(
        &self,
        _request: &Request,
    ) -> impl Future<Output = Result<Self::Output>> + Send {
        ready(Err(Error::Unsupported {
            operation: "get_catalog",
        }))
    }

    /// Replace the default base key for `request`. The kind suffix is still
    /// appended by the orchestrator.
    fn create_key(&self, _request: &Request) -> Option<String> {
        None
    }

    /// Provider-set configuration. Fields set here win over host options.
    fn options(&self) -> ProviderOptions {
        ProviderOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_sets() {
        let none = Capabilities::NONE;
        assert!(none.supports(ResourceKind::Data));
        assert!(!none.supports(ResourceKind::Layer));
        assert!(!none.supports(ResourceKind::Catalog));

        let layered = Capabilities::NONE.with_layer();
        assert!(layered.supports(ResourceKind::Layer));
        assert!(!layered.supports(ResourceKind::Catalog));

        let full = Capabilities::default().with_layer().with_catalog();
        assert!(full.supports(ResourceKind::Catalog));
    }

    struct DataOnly;

    impl Provider for DataOnly {
        type Output = String;

        async fn get_data(&self, _request: &Request) -> Result<String> {
            Ok("data".to_string())
        }
    }

    #[tokio::test]
    async fn test_default_optional_fetches_are_unsupported() {
        let provider = DataOnly;
        let request = Request::new("/foo");

        assert_eq!(provider.capabilities(), Capabilities::NONE);
        assert!(provider.create_key(&request).is_none());
        assert!(matches!(
            provider.get_layer(&request).await,
            Err(Error::Unsupported {
                operation: "get_layer"
            })
        ));
        assert!(matches!(
            provider.get_catalog(&request).await,
            Err(Error::Unsupported {
                operation: "get_catalog"
            })
        ));
    }
}
