//! Cache orchestrator - main entry point for pull operations.

use crate::backend::CacheStore;
use crate::builder::OrchestratorBuilder;
use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::hooks::{Identity, PassThrough, PostHook, PreHook};
use crate::key::{KeyDeriver, ResourceKind};
use crate::observability::CacheMetrics;
use crate::pipeline::{bounded, HookPipeline, Stage};
use crate::provider::Provider;
use crate::request::Request;
use crate::resource::Resource;
use crate::writeback::{PendingWrite, Pulled};
use std::future::Future;
use std::time::Instant;

/// Read-through cache in front of a [`Provider`].
///
/// Each pull derives a key, serves a fresh cached entry when there is one,
/// and otherwise fetches from the provider, hands the value back, and writes
/// it to the store if it carries a TTL.
///
/// Concurrent misses on the same key are not coalesced: each one fetches and
/// each one writes back.
///
/// # Example
///
/// ```ignore
/// use provider_pull::{backend::InMemoryStore, CacheOrchestrator, Request};
///
/// let cache = CacheOrchestrator::new(MyProvider, InMemoryStore::new());
/// let data = cache.pull(&Request::new("/foo").with_id("42")).await?;
/// ```
pub struct CacheOrchestrator<P, S, Pre = PassThrough, Post = Identity> {
    pub(crate) provider: P,
    pub(crate) store: S,
    pub(crate) pre_hook: Pre,
    pub(crate) post_hook: Post,
    pub(crate) metrics: Box<dyn CacheMetrics>,
    pub(crate) config: OrchestratorConfig,
}

impl<P: Provider, S: CacheStore> CacheOrchestrator<P, S> {
    /// Orchestrator with default hooks, no metrics and provider/default
    /// configuration.
    pub fn new(provider: P, store: S) -> Self {
        OrchestratorBuilder::new(provider, store).build()
    }

    /// Start configuring an orchestrator.
    pub fn builder(provider: P, store: S) -> OrchestratorBuilder<P, S> {
        OrchestratorBuilder::new(provider, store)
    }
}

impl<P, S, Pre, Post> CacheOrchestrator<P, S, Pre, Post>
where
    P: Provider,
    S: CacheStore,
    Pre: PreHook,
    Post: PostHook<P::Output>,
{
    /// Cache key for `request` and `kind`, honoring the provider's key
    /// override.
    pub fn cache_key(&self, request: &Request, kind: ResourceKind) -> String {
        let base = self
            .provider
            .create_key(request)
            .unwrap_or_else(|| KeyDeriver::base_key(request));
        KeyDeriver::with_kind(&base, kind)
    }

    /// Pull primary data, running the pre/post hooks around the fetch.
    ///
    /// # Errors
    ///
    /// Returns whatever the pre hook, `Provider::get_data` or the post hook
    /// returned, or `Error::Timeout` when a stage limit is configured and
    /// exceeded. Cache lookup and write-back failures are never returned.
    pub async fn pull(&self, request: &Request) -> Result<P::Output> {
        Ok(self.pull_deferred(request).await?.dispatch())
    }

    /// Pull a layer description. No hooks run.
    ///
    /// # Errors
    ///
    /// `Error::Unsupported` when the provider has no layer capability and
    /// there is no fresh cached layer; otherwise as for [`Self::pull`].
    pub async fn pull_layer(&self, request: &Request) -> Result<P::Output> {
        Ok(self.pull_layer_deferred(request).await?.dispatch())
    }

    /// Pull a catalog. No hooks run.
    ///
    /// # Errors
    ///
    /// `Error::Unsupported` when the provider has no catalog capability and
    /// there is no fresh cached catalog; otherwise as for [`Self::pull`].
    pub async fn pull_catalog(&self, request: &Request) -> Result<P::Output> {
        Ok(self.pull_catalog_deferred(request).await?.dispatch())
    }

    /// Like [`Self::pull`], but leaves the write-back to the caller.
    pub async fn pull_deferred(&self, request: &Request) -> Result<Pulled<P::Output>> {
        self.read_through(request, ResourceKind::Data, || {
            self.pipeline()
                .run(request, |request| self.provider.get_data(request))
        })
        .await
    }

    /// Like [`Self::pull_layer`], but leaves the write-back to the caller.
    pub async fn pull_layer_deferred(&self, request: &Request) -> Result<Pulled<P::Output>> {
        self.read_through(request, ResourceKind::Layer, || self.fetch_layer(request))
            .await
    }

    /// Like [`Self::pull_catalog`], but leaves the write-back to the caller.
    pub async fn pull_catalog_deferred(&self, request: &Request) -> Result<Pulled<P::Output>> {
        self.read_through(request, ResourceKind::Catalog, || {
            self.fetch_catalog(request)
        })
        .await
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn pipeline(&self) -> HookPipeline<'_, Pre, Post> {
        HookPipeline::new(&self.pre_hook, &self.post_hook)
            .with_stage_timeout(self.config.stage_timeout)
    }

    async fn fetch_layer(&self, request: &Request) -> Result<P::Output> {
        self.require(ResourceKind::Layer)?;
        bounded(
            self.config.stage_timeout,
            Stage::Fetch,
            self.provider.get_layer(request),
        )
        .await
    }

    async fn fetch_catalog(&self, request: &Request) -> Result<P::Output> {
        self.require(ResourceKind::Catalog)?;
        bounded(
            self.config.stage_timeout,
            Stage::Fetch,
            self.provider.get_catalog(request),
        )
        .await
    }

    fn require(&self, kind: ResourceKind) -> Result<()> {
        if self.provider.capabilities().supports(kind) {
            return Ok(());
        }
        let operation = match kind {
            ResourceKind::Data => "get_data",
            ResourceKind::Layer => "get_layer",
            ResourceKind::Catalog => "get_catalog",
        };
        Err(Error::Unsupported { operation })
    }

    async fn read_through<F, Fut>(
        &self,
        request: &Request,
        kind: ResourceKind,
        fetch: F,
    ) -> Result<Pulled<P::Output>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P::Output>>,
    {
        let timer = Instant::now();
        let key = self.cache_key(request, kind);
        debug!("» Pull {} for key: {}", kind, key);

        if let Some(value) = self.lookup(&key, request).await {
            self.metrics.record_hit(&key, timer.elapsed());
            return Ok(Pulled::cached(value));
        }

        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                debug!("✗ Pull failed for {}: {}", key, e);
                self.metrics.record_error(&key, &e.to_string());
                return Err(e);
            }
        };

        self.metrics.record_miss(&key, timer.elapsed());
        let write_back = self.prepare_write_back(key, &value);
        Ok(Pulled::fetched(value, write_back))
    }

    /// Fresh, decodable cached value for `key`. Everything else is a miss.
    async fn lookup(&self, key: &str, request: &Request) -> Option<P::Output> {
        let retrieved = bounded(
            self.config.stage_timeout,
            Stage::Lookup,
            self.store.retrieve(key, &request.query),
        )
        .await;

        let entry = match retrieved {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("✗ Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                debug!("✗ Cache lookup failed for {}, treating as miss: {}", key, e);
                return None;
            }
        };

        if !self.config.freshness.is_fresh(Some(&entry)) {
            debug!("✗ Stale entry for {}", key);
            return None;
        }

        match <P::Output as Resource>::deserialize_from_cache(&entry.payload) {
            Ok(value) => {
                debug!("✓ Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                debug!("✗ Undecodable entry for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    fn prepare_write_back(&self, key: String, value: &P::Output) -> Option<PendingWrite> {
        let ttl = value.ttl().filter(|ttl| !ttl.is_zero())?;

        match value.serialize_for_cache() {
            Ok(payload) => Some(PendingWrite::new(self.store.clone(), key, payload, ttl)),
            Err(e) => {
                debug!("✗ Skipping write-back for {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::backend::{InMemoryStore, UpsertOptions};
    use crate::config::ProviderOptions;
    use crate::entry::CachedEntry;
    use crate::freshness::FreshnessPolicy;
    use crate::hooks::{post_hook_fn, pre_hook_fn};
    use crate::provider::Capabilities;
    use crate::request::QueryOptions;
    use crate::resource::FetchResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime};

    type Payload = FetchResult<String>;

    #[derive(Default)]
    struct TestProvider {
        data_calls: AtomicUsize,
        layer_calls: AtomicUsize,
        ttl: Option<Duration>,
        capabilities: Capabilities,
        key_override: Option<String>,
        fail: bool,
    }

    impl Provider for TestProvider {
        type Output = Payload;

        async fn get_data(&self, request: &Request) -> Result<Payload> {
            self.data_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::FetchError("upstream unavailable".to_string()));
            }
            Ok(FetchResult {
                data: format!("data:{}", request.route_base()),
                ttl: self.ttl,
            })
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        async fn get_layer(&self, _request: &Request) -> Result<Payload> {
            self.layer_calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResult {
                data: "layer".to_string(),
                ttl: self.ttl,
            })
        }

        fn create_key(&self, _request: &Request) -> Option<String> {
            self.key_override.clone()
        }
    }

    /// Store whose lookups always fail.
    #[derive(Clone, Default)]
    struct BrokenStore {
        writes: Arc<Mutex<Vec<String>>>,
    }

    impl CacheStore for BrokenStore {
        async fn retrieve(&self, _key: &str, _query: &QueryOptions) -> Result<Option<CachedEntry>> {
            Err(Error::BackendError("connection refused".to_string()))
        }

        async fn upsert(&self, key: &str, _payload: Vec<u8>, _options: UpsertOptions) -> Result<()> {
            self.writes
                .lock()
                .expect("Failed to lock writes")
                .push(key.to_string());
            Err(Error::BackendError("read-only".to_string()))
        }
    }

    fn seeded(store: &InMemoryStore, key: &str, value: &Payload, expires: Option<SystemTime>) {
        let payload = value.serialize_for_cache().expect("Failed to serialize");
        let entry = match expires {
            Some(at) => CachedEntry::with_expiry(payload, at),
            None => CachedEntry::new(payload),
        };
        store.put_entry(key, entry);
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_fetch() {
        let store = InMemoryStore::new();
        let cached = FetchResult::transient("cached".to_string());
        seeded(
            &store,
            "foo::42::data",
            &cached,
            Some(SystemTime::now() + Duration::from_secs(60)),
        );

        let cache = CacheOrchestrator::new(TestProvider::default(), store);
        let pulled = cache
            .pull_deferred(&Request::new("/foo").with_id("42"))
            .await
            .expect("Pull failed");

        assert!(pulled.from_cache);
        assert!(pulled.write_back.is_none());
        assert_eq!(pulled.value.data, "cached");
        assert_eq!(cache.provider().data_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_entry_without_expiry_is_served() {
        let store = InMemoryStore::new();
        seeded(&store, "foo::data", &FetchResult::transient("old".to_string()), None);

        let cache = CacheOrchestrator::new(TestProvider::default(), store);
        let value = cache.pull(&Request::new("/foo")).await.expect("Pull failed");

        assert_eq!(value.data, "old");
        assert_eq!(cache.provider().data_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_require_expiry_refetches_bare_entries() {
        let store = InMemoryStore::new();
        seeded(&store, "foo::data", &FetchResult::transient("old".to_string()), None);

        let cache = CacheOrchestrator::builder(TestProvider::default(), store)
            .with_options(ProviderOptions {
                freshness: Some(FreshnessPolicy::RequireExpiry),
                ..Default::default()
            })
            .build();
        let value = cache.pull(&Request::new("/foo")).await.expect("Pull failed");

        assert_eq!(value.data, "data:foo");
        assert_eq!(cache.provider().data_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_miss_with_ttl_prepares_write() {
        let provider = TestProvider {
            ttl: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let store = InMemoryStore::new();
        let cache = CacheOrchestrator::new(provider, store.clone());

        let pulled = cache
            .pull_deferred(&Request::new("/foo").with_host("h1").with_id("42"))
            .await
            .expect("Pull failed");

        assert!(!pulled.from_cache);
        assert_eq!(pulled.value.data, "data:foo");
        let write = pulled.write_back.expect("Write-back missing");
        assert_eq!(write.key(), "foo::h1::42::data");
        assert_eq!(write.ttl(), Duration::from_secs(120));

        // Nothing is written until the caller commits.
        assert!(store.is_empty());
        write.commit().await.expect("Failed to commit");
        assert!(store.entry("foo::h1::42::data").is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_cached() {
        let provider = TestProvider {
            ttl: Some(Duration::ZERO),
            ..Default::default()
        };
        let cache = CacheOrchestrator::new(provider, InMemoryStore::new());

        let pulled = cache
            .pull_deferred(&Request::new("/foo"))
            .await
            .expect("Pull failed");
        assert!(pulled.write_back.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let provider = TestProvider {
            fail: true,
            ttl: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let store = InMemoryStore::new();
        let cache = CacheOrchestrator::new(provider, store.clone());

        let err = cache
            .pull(&Request::new("/foo"))
            .await
            .expect_err("Pull should fail");
        assert!(matches!(err, Error::FetchError(_)));

        tokio::task::yield_now().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_key_override_keeps_kind_suffix() {
        let provider = TestProvider {
            key_override: Some("custom".to_string()),
            capabilities: Capabilities::NONE.with_layer(),
            ..Default::default()
        };
        let cache = CacheOrchestrator::new(provider, InMemoryStore::new());
        let request = Request::new("/foo").with_id("42");

        assert_eq!(cache.cache_key(&request, ResourceKind::Data), "custom::data");
        assert_eq!(cache.cache_key(&request, ResourceKind::Layer), "custom::layer");
    }

    #[tokio::test]
    async fn test_layer_without_capability_is_unsupported() {
        let cache = CacheOrchestrator::new(TestProvider::default(), InMemoryStore::new());

        let err = cache
            .pull_layer(&Request::new("/foo"))
            .await
            .expect_err("Layer pull should fail");

        assert!(matches!(
            err,
            Error::Unsupported {
                operation: "get_layer"
            }
        ));
        assert_eq!(cache.provider().layer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cached_layer_served_without_capability() {
        let store = InMemoryStore::new();
        seeded(
            &store,
            "foo::layer",
            &FetchResult::transient("cached layer".to_string()),
            None,
        );
        let cache = CacheOrchestrator::new(TestProvider::default(), store);

        let value = cache
            .pull_layer(&Request::new("/foo"))
            .await
            .expect("Layer pull failed");
        assert_eq!(value.data, "cached layer");
    }

    #[tokio::test]
    async fn test_layer_and_catalog_skip_hooks() {
        let pre_calls = Arc::new(AtomicUsize::new(0));
        let counter = pre_calls.clone();
        let provider = TestProvider {
            capabilities: Capabilities::NONE.with_layer(),
            ..Default::default()
        };

        let cache = CacheOrchestrator::builder(provider, InMemoryStore::new())
            .with_pre_hook(pre_hook_fn(move |_: &Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::HookAborted("blocked".to_string()))
            }))
            .build();

        let value = cache
            .pull_layer(&Request::new("/foo"))
            .await
            .expect("Layer pull failed");
        assert_eq!(value.data, "layer");
        assert_eq!(pre_calls.load(Ordering::SeqCst), 0);

        let err = cache
            .pull_catalog(&Request::new("/foo"))
            .await
            .expect_err("Catalog pull should fail");
        assert!(matches!(
            err,
            Error::Unsupported {
                operation: "get_catalog"
            }
        ));

        let err = cache
            .pull(&Request::new("/foo"))
            .await
            .expect_err("Data pull should be blocked");
        assert!(matches!(err, Error::HookAborted(_)));
        assert_eq!(pre_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.provider().data_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_hook_result_is_what_gets_cached() {
        let provider = TestProvider {
            ttl: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let store = InMemoryStore::new();
        let cache = CacheOrchestrator::builder(provider, store.clone())
            .with_post_hook(post_hook_fn(|_: &Request, mut value: Payload| {
                value.data.push_str("+post");
                Ok(value)
            }))
            .build();

        let pulled = cache
            .pull_deferred(&Request::new("/foo"))
            .await
            .expect("Pull failed");
        assert_eq!(pulled.value.data, "data:foo+post");

        pulled
            .write_back
            .expect("Write-back missing")
            .commit()
            .await
            .expect("Failed to commit");

        let entry = store.entry("foo::data").expect("Entry missing");
        let cached = Payload::deserialize_from_cache(&entry.payload).expect("Failed to decode");
        assert_eq!(cached.data, "data:foo+post");
    }

    #[tokio::test]
    async fn test_lookup_and_write_failures_are_absorbed() {
        let provider = TestProvider {
            ttl: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let store = BrokenStore::default();
        let cache = CacheOrchestrator::new(provider, store.clone());

        let value = cache.pull(&Request::new("/foo")).await.expect("Pull failed");
        assert_eq!(value.data, "data:foo");

        for _ in 0..10 {
            if !store.writes.lock().expect("Failed to lock writes").is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(
            *store.writes.lock().expect("Failed to lock writes"),
            vec!["foo::data".to_string()]
        );
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = InMemoryStore::new();
        store.put_entry("foo::data", CachedEntry::new(b"garbage".to_vec()));
        let cache = CacheOrchestrator::new(TestProvider::default(), store);

        let value = cache.pull(&Request::new("/foo")).await.expect("Pull failed");
        assert_eq!(value.data, "data:foo");
        assert_eq!(cache.provider().data_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metrics_see_hits_misses_and_errors() {
        use crate::observability::CacheMetrics;

        #[derive(Clone, Default)]
        struct Counts {
            hits: Arc<AtomicUsize>,
            misses: Arc<AtomicUsize>,
            errors: Arc<AtomicUsize>,
        }

        impl CacheMetrics for Counts {
            fn record_hit(&self, _key: &str, _duration: Duration) {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }

            fn record_miss(&self, _key: &str, _duration: Duration) {
                self.misses.fetch_add(1, Ordering::SeqCst);
            }

            fn record_error(&self, _key: &str, _error: &str) {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counts = Counts::default();
        let provider = TestProvider {
            ttl: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let cache = CacheOrchestrator::builder(provider, InMemoryStore::new())
            .with_metrics(Box::new(counts.clone()))
            .build();
        let request = Request::new("/foo");

        let pulled = cache.pull_deferred(&request).await.expect("Pull failed");
        pulled
            .write_back
            .expect("Write-back missing")
            .commit()
            .await
            .expect("Failed to commit");
        cache.pull(&request).await.expect("Pull failed");
        let _ = cache.pull_layer(&request).await;

        assert_eq!(counts.misses.load(Ordering::SeqCst), 1);
        assert_eq!(counts.hits.load(Ordering::SeqCst), 1);
        assert_eq!(counts.errors.load(Ordering::SeqCst), 1);
    }
}
