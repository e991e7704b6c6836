//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::cache::Cache;

use super::in_memory::{DEFAULT_MAX_BYTES, InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Environment variable holding the remote key-value backend URL
pub const KV_URL_ENV: &str = "KV_URL";
/// Environment variable holding the remote key-value access token
pub const KV_TOKEN_ENV: &str = "KV_TOKEN";

/// Supported cache types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

/// Configuration for cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Remote backend URL
    pub remote_url: Option<String>,
    /// Remote backend access token
    pub remote_token: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Memory budget in bytes (for in-memory cache)
    pub max_capacity: Option<u64>,
    /// Time to idle (for in-memory cache)
    pub time_to_idle: Option<Duration>,
    /// Connection timeout (for remote cache)
    pub connection_timeout: Duration,
    /// Per-command timeout (for remote cache)
    pub command_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_token: None,
            key_prefix: Some("npmx".to_string()),
            max_capacity: Some(DEFAULT_MAX_BYTES),
            time_to_idle: None,
            connection_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
        }
    }
}

impl CacheConfig {
    /// Creates a configuration for the process-local cache
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration for a remote cache
    pub fn remote(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            remote_url: Some(url.into()),
            remote_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the memory budget in bytes (in-memory only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the time-to-idle (in-memory only)
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    /// Backend selected by this configuration
    ///
    /// The remote backend needs both a URL and a token; anything less
    /// selects the in-memory fallback.
    pub fn cache_type(&self) -> CacheType {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        if present(&self.remote_url) && present(&self.remote_token) {
            CacheType::Redis
        } else {
            CacheType::InMemory
        }
    }

    /// Creates config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            remote_url: lookup(KV_URL_ENV),
            remote_token: lookup(KV_TOKEN_ENV),
            key_prefix: lookup("CACHE_KEY_PREFIX").or(defaults.key_prefix),
            max_capacity: lookup("CACHE_MAX_BYTES")
                .and_then(|v| v.parse().ok())
                .or(defaults.max_capacity),
            time_to_idle: None,
            connection_timeout: defaults.connection_timeout,
            command_timeout: lookup("CACHE_COMMAND_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_timeout),
        }
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration
    ///
    /// Never fails: an unreachable remote backend falls back to the
    /// in-memory cache with a warning.
    pub async fn create(&self, config: &CacheConfig) -> Arc<dyn Cache> {
        match config.cache_type() {
            CacheType::InMemory => {
                info!("Using in-memory cache (no remote backend configured)");
                self.create_in_memory(config)
            }
            CacheType::Redis => match self.create_redis(config).await {
                Ok(cache) => {
                    info!("Using remote cache backend");
                    cache
                }
                Err(e) => {
                    warn!(error = %e, "Remote cache unavailable, falling back to in-memory cache");
                    self.create_in_memory(config)
                }
            },
        }
    }

    /// Creates an in-memory cache
    pub fn create_in_memory(&self, config: &CacheConfig) -> Arc<dyn Cache> {
        let mut in_memory_config = InMemoryCacheConfig::default();

        if let Some(capacity) = config.max_capacity {
            in_memory_config = in_memory_config.with_max_capacity(capacity);
        }

        if let Some(tti) = config.time_to_idle {
            in_memory_config = in_memory_config.with_time_to_idle(tti);
        }

        Arc::new(InMemoryCache::with_config(in_memory_config))
    }

    async fn create_redis(
        &self,
        config: &CacheConfig,
    ) -> Result<Arc<dyn Cache>, crate::domain::DomainError> {
        let url = config.remote_url.clone().unwrap_or_default();
        let mut redis_config = RedisCacheConfig::new(url)
            .with_connection_timeout(config.connection_timeout)
            .with_command_timeout(config.command_timeout);

        if let Some(token) = &config.remote_token {
            redis_config = redis_config.with_token(token.clone());
        }

        if let Some(prefix) = &config.key_prefix {
            redis_config = redis_config.with_key_prefix(prefix.clone());
        }

        let cache = RedisCache::new(redis_config).await?;
        Ok(Arc::new(cache))
    }
}
