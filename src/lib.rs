//! npmx API
//!
//! Server-side data layer for npmx.dev:
//! - Cached remote fetches with stale-while-revalidate and request coalescing
//! - Cached HTTP routes proxying the npm registry, jsDelivr, GitHub, JSR,
//!   Gravatar and the AT Protocol backlink index
//! - Client data composables consuming those routes

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::Cache;
use infrastructure::cache::{CacheConfig, CacheFactory};
use infrastructure::http::HttpClient;
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration.
///
/// The cache backend comes from `KV_URL`/`KV_TOKEN`; see [`CacheConfig::from_env`].
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = create_cache().await;
    create_app_state_with_cache(config, cache)
}

/// Create the application state over an existing cache backend
pub fn create_app_state_with_cache(
    config: &AppConfig,
    cache: Arc<dyn Cache>,
) -> anyhow::Result<AppState> {
    let upstream = HttpClient::new(config.upstream.timeout(), &config.upstream.user_agent)?;

    info!(
        cache_backend = cache.backend_name(),
        registry = %config.upstream.npm_registry_url,
        "Application state initialized"
    );

    Ok(AppState::new(cache, Arc::new(upstream), config))
}

/// Cache backend selected from the environment
pub async fn create_cache() -> Arc<dyn Cache> {
    CacheFactory::new().create(&CacheConfig::from_env()).await
}
