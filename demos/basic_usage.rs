//! Basic usage example of the pull orchestrator.

use provider_pull::{
    backend::InMemoryStore, error::Result, hooks::pre_hook_fn, CacheOrchestrator, Capabilities,
    Error, FetchResult, Provider, Request,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Example payload: a tiny feature collection
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Feature {
    id: u32,
    name: String,
}

type Features = FetchResult<Vec<Feature>>;

/// Mock provider that simulates a remote feature service
struct TrailsProvider;

impl Provider for TrailsProvider {
    type Output = Features;

    async fn get_data(&self, request: &Request) -> Result<Features> {
        println!("  [UPSTREAM] Fetching features for {}", request.route);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let features = vec![
            Feature {
                id: 1,
                name: "Ridge Loop".to_string(),
            },
            Feature {
                id: 2,
                name: "Creek Path".to_string(),
            },
        ];
        Ok(FetchResult::cached_for(features, Duration::from_secs(300)))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.with_catalog()
    }

    async fn get_catalog(&self, _request: &Request) -> Result<Features> {
        println!("  [UPSTREAM] Fetching catalog");
        Ok(FetchResult::transient(vec![Feature {
            id: 0,
            name: "trails".to_string(),
        }]))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Provider Pull - Basic Example ===\n");

    // 1. Initialize store and orchestrator
    println!("1. Initializing in-memory store...");
    let store = InMemoryStore::new();
    let cache = CacheOrchestrator::builder(TrailsProvider, store.clone())
        .with_pre_hook(pre_hook_fn(|request: &Request| match request.params.id {
            Some(_) => Ok(()),
            None => Err(Error::HookAborted("an id is required".to_string())),
        }))
        .build();
    println!("   ✓ Orchestrator ready\n");

    let request = Request::new("/trails/FeatureServer/0").with_id("park-12");

    // 2. First request - cache miss, fetch from upstream
    println!("2. First pull ({}):", request.route);
    let features = cache.pull(&request).await?;
    println!("   ✓ {} features loaded\n", features.data.len());

    // Let the background write-back land
    tokio::time::sleep(Duration::from_millis(10)).await;

    // 3. Second request - cache hit
    println!("3. Second pull, same request:");
    let features = cache.pull(&request).await?;
    println!("   ✓ {} features served from cache\n", features.data.len());

    // 4. Pre hook veto
    println!("4. Pull without an id:");
    match cache.pull(&Request::new("/trails")).await {
        Err(e) => println!("   ✓ Rejected: {}\n", e),
        Ok(_) => println!("   ✗ Unexpectedly accepted\n"),
    }

    // 5. Layer is not supported by this provider
    println!("5. Layer pull:");
    match cache.pull_layer(&request).await {
        Err(e) => println!("   ✓ {}\n", e),
        Ok(_) => println!("   ✗ Unexpected layer\n"),
    }

    // 6. Catalog has no TTL, so it is never cached
    println!("6. Catalog pull:");
    let catalog = cache.pull_catalog(&request).await?;
    println!("   ✓ Catalog: {:?}", catalog.data);
    println!("   ✓ Store holds {} entr(ies)\n", store.len());

    println!("=== Example Complete ===\n");

    Ok(())
}
