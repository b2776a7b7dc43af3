//! Request descriptor handed to the orchestrator by the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query/options bag passed through to the store and the fetch functions.
pub type QueryOptions = Map<String, Value>;

/// Routing parameters extracted by the host from the incoming request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
}

/// What the caller wants pulled.
///
/// A request is borrowed immutably for the whole orchestration call.
///
/// # Example
///
/// ```
/// use provider_pull::Request;
///
/// let request = Request::new("/foo/FeatureServer")
///     .with_host("h1")
///     .with_id("42")
///     .with_query("where", "1=1");
///
/// assert_eq!(request.params.host.as_deref(), Some("h1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Route of the request; its first segment names the resource family.
    pub route: String,
    #[serde(default)]
    pub params: RouteParams,
    #[serde(default)]
    pub query: QueryOptions,
}

impl Request {
    pub fn new(route: impl Into<String>) -> Self {
        Request {
            route: route.into(),
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.params.host = Some(host.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.params.id = Some(id.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.params.layer = Some(layer.into());
        self
    }

    /// Add one entry to the query/options bag.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// First segment of the route, without leading slash or query string.
    ///
    /// `"/foo/bar?x=1"` → `"foo"`.
    pub fn route_base(&self) -> &str {
        let path = self.route.split('?').next().unwrap_or_default();
        path.trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
    }
}
