//! Application state for shared services

use std::sync::Arc;

use crate::config::{AppConfig, CacheSettings};
use crate::domain::{Cache, PreferencesStore, SessionStore, UpstreamClient};
use crate::infrastructure::fetch::CachedFetcher;
use crate::infrastructure::services::{
    CachePreferencesStore, CacheSessionStore, ChangelogService, ChangelogServiceConfig,
    GravatarService, JsrService, LikesService, ReadmeService, RegistryService,
};

/// Shared services, constructed once at startup and injected into handlers
#[derive(Clone)]
pub struct AppState {
    pub fetcher: CachedFetcher,
    pub cache_settings: Arc<CacheSettings>,
    pub registry: Arc<RegistryService>,
    pub readme: Arc<ReadmeService>,
    pub changelog: Arc<ChangelogService>,
    pub jsr: Arc<JsrService>,
    pub gravatar: Arc<GravatarService>,
    pub likes: Arc<LikesService>,
    pub preferences: Arc<dyn PreferencesStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_cookie: Arc<str>,
}

impl AppState {
    /// Wires every service over one cache backend and one upstream client
    pub fn new(cache: Arc<dyn Cache>, upstream: Arc<dyn UpstreamClient>, config: &AppConfig) -> Self {
        let urls = &config.upstream;
        let registry = RegistryService::new(upstream.clone(), &urls.npm_registry_url);

        let changelog = ChangelogService::new(
            upstream.clone(),
            registry.clone(),
            ChangelogServiceConfig {
                github_api_url: urls.github_api_url.clone(),
                github_token: urls.github_token.clone(),
                jsdelivr_data_url: urls.jsdelivr_data_url.clone(),
                cdn_url: urls.jsdelivr_cdn_url.clone(),
            },
        );

        Self {
            fetcher: CachedFetcher::new(cache.clone(), upstream.clone()),
            cache_settings: Arc::new(config.cache.clone()),
            readme: Arc::new(ReadmeService::new(
                upstream.clone(),
                registry.clone(),
                &urls.jsdelivr_cdn_url,
            )),
            changelog: Arc::new(changelog),
            jsr: Arc::new(JsrService::new(upstream.clone(), &urls.jsr_url)),
            gravatar: Arc::new(GravatarService::new(upstream.clone(), &urls.gravatar_url)),
            likes: Arc::new(LikesService::new(upstream, &urls.constellation_url)),
            registry: Arc::new(registry),
            preferences: Arc::new(CachePreferencesStore::new(cache.clone())),
            sessions: Arc::new(CacheSessionStore::new(cache, config.session.ttl())),
            session_cookie: Arc::from(config.session.cookie_name.as_str()),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("fetcher", &self.fetcher)
            .field("cache_settings", &self.cache_settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::UpstreamSettings;
    use crate::domain::fetch::MockUpstream;
    use crate::infrastructure::cache::InMemoryCache;

    /// Base URL every mocked upstream service answers under
    pub const UPSTREAM: &str = "http://upstream.test";

    /// State over an in-memory cache and the given mocked upstream
    pub fn state_with(upstream: Arc<MockUpstream>) -> AppState {
        let config = AppConfig {
            upstream: UpstreamSettings::all_at(UPSTREAM),
            ..AppConfig::default()
        };

        AppState::new(Arc::new(InMemoryCache::new()), upstream, &config)
    }
}
