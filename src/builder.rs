//! Builder assembling an orchestrator once, at construction.

use crate::backend::CacheStore;
use crate::config::{OrchestratorConfig, ProviderOptions};
use crate::hooks::{Identity, PassThrough, PostHook, PreHook};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::orchestrator::CacheOrchestrator;
use crate::provider::Provider;

/// Fluent builder for [`CacheOrchestrator`].
///
/// Hooks default to [`PassThrough`] and [`Identity`]. Host options set here
/// are overridden field by field by [`Provider::options`].
///
/// # Example
///
/// ```ignore
/// use provider_pull::{hooks::pre_hook_fn, CacheOrchestrator, ProviderOptions};
///
/// let cache = CacheOrchestrator::builder(provider, store)
///     .with_pre_hook(pre_hook_fn(|request| authorize(request)))
///     .with_options(ProviderOptions::from_env()?)
///     .build();
/// ```
pub struct OrchestratorBuilder<P, S, Pre = PassThrough, Post = Identity> {
    provider: P,
    store: S,
    pre_hook: Pre,
    post_hook: Post,
    metrics: Box<dyn CacheMetrics>,
    options: ProviderOptions,
}

impl<P: Provider, S: CacheStore> OrchestratorBuilder<P, S> {
    pub fn new(provider: P, store: S) -> Self {
        OrchestratorBuilder {
            provider,
            store,
            pre_hook: PassThrough,
            post_hook: Identity,
            metrics: Box::new(NoOpMetrics),
            options: ProviderOptions::default(),
        }
    }
}

impl<P: Provider, S: CacheStore, Pre, Post> OrchestratorBuilder<P, S, Pre, Post> {
    /// Hook run before every primary-data fetch.
    pub fn with_pre_hook<H: PreHook>(self, hook: H) -> OrchestratorBuilder<P, S, H, Post> {
        OrchestratorBuilder {
            provider: self.provider,
            store: self.store,
            pre_hook: hook,
            post_hook: self.post_hook,
            metrics: self.metrics,
            options: self.options,
        }
    }

    /// Hook run after every successful primary-data fetch.
    pub fn with_post_hook<H: PostHook<P::Output>>(
        self,
        hook: H,
    ) -> OrchestratorBuilder<P, S, Pre, H> {
        OrchestratorBuilder {
            provider: self.provider,
            store: self.store,
            pre_hook: self.pre_hook,
            post_hook: hook,
            metrics: self.metrics,
            options: self.options,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Host-level options; provider-set values still win.
    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> CacheOrchestrator<P, S, Pre, Post>
    where
        Pre: PreHook,
        Post: PostHook<P::Output>,
    {
        let config = OrchestratorConfig::resolve(&self.provider.options(), &self.options);
        debug!("✓ Orchestrator configured: {:?}", config);

        CacheOrchestrator {
            provider: self.provider,
            store: self.store,
            pre_hook: self.pre_hook,
            post_hook: self.post_hook,
            metrics: self.metrics,
            config,
        }
    }
}
