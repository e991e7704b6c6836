//! Cached fetch with stale-while-revalidate and request coalescing

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheEntry, CacheExt, CacheKeyGenerator, DefaultKeyGenerator};
use crate::domain::fetch::{
    AbortSignal, CacheStatus, FetchPolicy, FetchRequest, FetchResult, UpstreamClient,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_cache_outcome;

use super::inflight::{InflightRegistry, SharedFetch};

/// Namespace of keys derived from outbound URLs
pub const FETCH_NAMESPACE: &str = "fetch";

/// Cache-backed fetcher shared by every route and CLI command
///
/// Entries are stored as [`CacheEntry`] values so staleness is judged from
/// the stored timestamp, while the backend keeps them for the policy's
/// retention period.
#[derive(Debug, Clone)]
pub struct CachedFetcher {
    cache: Arc<dyn Cache>,
    upstream: Arc<dyn UpstreamClient>,
    inflight: InflightRegistry,
    key_generator: DefaultKeyGenerator,
}

impl CachedFetcher {
    pub fn new(cache: Arc<dyn Cache>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            cache,
            upstream,
            inflight: InflightRegistry::new(),
            key_generator: DefaultKeyGenerator::new().with_short_hash(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn upstream(&self) -> &Arc<dyn UpstreamClient> {
        &self.upstream
    }

    /// Whether a fetch for `key` is currently outstanding
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inflight.contains(key)
    }

    /// Cache key for an outbound request
    pub fn key_for(&self, request: &FetchRequest) -> String {
        self.key_generator
            .generate_with_namespace(FETCH_NAMESPACE, &request.key_params())
    }

    /// Fetches a URL through the cache and deserializes the payload
    pub async fn fetch<T>(
        &self,
        request: FetchRequest,
        policy: FetchPolicy,
        signal: Option<&AbortSignal>,
    ) -> Result<FetchResult<T>, DomainError>
    where
        T: DeserializeOwned,
    {
        let result = self.fetch_value(request, policy, signal).await?;

        result.try_map(|value| {
            serde_json::from_value(value)
                .map_err(|e| DomainError::internal(format!("Unexpected payload shape: {}", e)))
        })
    }

    /// Fetches a URL through the cache, returning the raw JSON payload
    pub async fn fetch_value(
        &self,
        request: FetchRequest,
        policy: FetchPolicy,
        signal: Option<&AbortSignal>,
    ) -> Result<FetchResult<Value>, DomainError> {
        let key = self.key_for(&request);
        let upstream = self.upstream.clone();

        self.get_or_fetch(&key, policy, signal, move || async move {
            upstream.fetch(&request).await
        })
        .await
    }

    /// Serves `key` from the cache, falling back to `producer`.
    ///
    /// The producer runs at most once per key at a time; concurrent callers
    /// wait on the same flight. A fresh entry is a hit. A stale entry is
    /// served as-is and refreshed in the background when SWR is enabled,
    /// otherwise it is treated like a miss.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        policy: FetchPolicy,
        signal: Option<&AbortSignal>,
        producer: F,
    ) -> Result<FetchResult<Value>, DomainError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, DomainError>> + Send + 'static,
    {
        let namespace = namespace_of(key);

        if signal.is_some_and(AbortSignal::is_aborted) {
            return Err(DomainError::Aborted);
        }

        if !policy.bypass {
            if let Some(entry) = self.read_entry(key).await {
                if !entry.is_stale() {
                    debug!(key, "Cache hit");
                    record_cache_outcome(namespace, CacheStatus::Hit);
                    return Ok(FetchResult::new(entry.value, CacheStatus::Hit));
                }

                if policy.swr {
                    debug!(key, "Serving stale entry while revalidating");
                    record_cache_outcome(namespace, CacheStatus::Stale);
                    self.revalidate(key, policy, producer);
                    return Ok(FetchResult::new(entry.value, CacheStatus::Stale));
                }
            }
        }

        let status = if policy.bypass {
            CacheStatus::Bypass
        } else {
            CacheStatus::Miss
        };
        debug!(key, status = %status, "Fetching from upstream");
        record_cache_outcome(namespace, status);

        let flight = self
            .inflight
            .join_or_start(key, Self::flight_task(self.cache.clone(), key.to_string(), policy, producer, false));

        let value = wait_for(flight.fetch, signal).await?;
        Ok(FetchResult::new(value, status))
    }

    /// Starts a background refresh unless one is already running for `key`
    fn revalidate<F, Fut>(&self, key: &str, policy: FetchPolicy, producer: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, DomainError>> + Send + 'static,
    {
        let flight = self
            .inflight
            .join_or_start(key, Self::flight_task(self.cache.clone(), key.to_string(), policy, producer, true));

        if !flight.started {
            debug!(key, "Refresh already in flight");
        }
    }

    /// Builds the future run by a flight: produce, then write back.
    ///
    /// Nothing runs until the registry spawns it.
    fn flight_task<F, Fut>(
        cache: Arc<dyn Cache>,
        key: String,
        policy: FetchPolicy,
        producer: F,
        background: bool,
    ) -> impl Future<Output = Result<Value, DomainError>> + Send
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, DomainError>> + Send + 'static,
    {
        async move {
            let value = match producer().await {
                Ok(value) => value,
                Err(e) => {
                    if background {
                        warn!(key = %key, error = %e, "Background refresh failed, keeping stale entry");
                    } else {
                        debug!(key = %key, error = %e, "Upstream fetch failed");
                    }
                    return Err(e);
                }
            };

            let entry = CacheEntry::new(value, policy.ttl);
            if let Err(e) = cache.set(&key, &entry, policy.retention()).await {
                warn!(key = %key, error = %e, "Failed to write cache entry");
            }

            Ok(entry.value)
        }
    }

    async fn read_entry(&self, key: &str) -> Option<CacheEntry<Value>> {
        let entry: Result<Option<CacheEntry<Value>>, DomainError> = self.cache.get(key).await;

        match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }
}

/// Waits for a shared fetch unless the caller's signal fires first
async fn wait_for(
    fetch: SharedFetch,
    signal: Option<&AbortSignal>,
) -> Result<Value, DomainError> {
    match signal {
        Some(signal) => tokio::select! {
            result = fetch => result,
            _ = signal.aborted() => Err(DomainError::Aborted),
        },
        None => fetch.await,
    }
}

/// Leading key segment, used as a metrics label
fn namespace_of(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}
