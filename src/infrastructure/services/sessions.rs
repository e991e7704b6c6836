//! Session store on top of the cache adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::{CACHE_VERSION, Cache, CacheExt};
use crate::domain::{DomainError, Session, SessionStore};

const SESSION_NAMESPACE: &str = "session";

#[derive(Debug, Clone)]
pub struct CacheSessionStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheSessionStore {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(id: &str) -> String {
        format!("{}:{}:{}", SESSION_NAMESPACE, CACHE_VERSION, id)
    }
}

#[async_trait]
impl SessionStore for CacheSessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, DomainError> {
        if id.trim().is_empty() {
            return Ok(None);
        }

        self.cache.get(&Self::key(id)).await
    }

    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        self.cache.set(&Self::key(&session.id), session, self.ttl).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        self.cache.delete(&Self::key(id)).await
    }
}
