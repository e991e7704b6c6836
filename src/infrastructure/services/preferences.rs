//! Preferences store on top of the cache adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::{CACHE_VERSION, Cache, CacheExt};
use crate::domain::{Did, DomainError, PreferencesStore, UserPreferences};

const PREFERENCES_NAMESPACE: &str = "preferences";

/// Preferences outlive any cached upstream data
const PREFERENCES_TTL: Duration = Duration::from_secs(365 * 86_400);

#[derive(Debug, Clone)]
pub struct CachePreferencesStore {
    cache: Arc<dyn Cache>,
}

impl CachePreferencesStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    fn key(did: &Did) -> String {
        format!("{}:{}:{}", PREFERENCES_NAMESPACE, CACHE_VERSION, did)
    }
}

#[async_trait]
impl PreferencesStore for CachePreferencesStore {
    async fn get(&self, did: &Did) -> Result<Option<UserPreferences>, DomainError> {
        self.cache.get(&Self::key(did)).await
    }

    async fn save(&self, did: &Did, preferences: &UserPreferences) -> Result<(), DomainError> {
        self.cache
            .set(&Self::key(did), preferences, PREFERENCES_TTL)
            .await
    }
}
