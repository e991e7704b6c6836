//! Redis cache implementation (remote key-value backend)

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo, RedisResult};

use crate::domain::DomainError;
use crate::domain::cache::Cache;

const SCAN_BATCH: usize = 1000;

/// Configuration for Redis cache
#[derive(Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "rediss://kv.example.com:6379")
    pub url: String,
    /// Access token, sent as the connection password
    pub token: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Upper bound for a single command after connecting
    pub command_timeout: Duration,
}

impl fmt::Debug for RedisCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("key_prefix", &self.key_prefix)
            .field("connection_timeout", &self.connection_timeout)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            token: None,
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Shared across server instances; concurrent writers to the same key
/// race and the last write wins.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let mut info = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| DomainError::cache(format!("Invalid Redis URL: {}", e)))?;

        if let Some(token) = &config.token {
            info.redis.password = Some(token.clone());
        }

        let client = Client::open(info)
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn scan_prefixed(&self) -> Result<Vec<String>, DomainError> {
        let pattern = self.prefix_key("*");
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = bounded(
                self.config.command_timeout,
                "scan keys",
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn),
            )
            .await?;

            found.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        bounded(
            self.config.command_timeout,
            &format!("get key '{}'", key),
            conn.get(&prefixed_key),
        )
        .await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        bounded(
            self.config.command_timeout,
            &format!("set key '{}'", key),
            conn.set_ex(&prefixed_key, value, ttl_secs),
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = bounded(
            self.config.command_timeout,
            &format!("delete key '{}'", key),
            conn.del(&prefixed_key),
        )
        .await?;

        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        bounded(
            self.config.command_timeout,
            &format!("check existence of key '{}'", key),
            conn.exists(&prefixed_key),
        )
        .await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs: i64 = bounded(
            self.config.command_timeout,
            &format!("get TTL for key '{}'", key),
            conn.ttl(&prefixed_key),
        )
        .await?;

        // -2: missing key, -1: no expiry
        if ttl_secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(ttl_secs as u64)))
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        match &self.config.key_prefix {
            Some(_) => {
                let keys = self.scan_prefixed().await?;

                for chunk in keys.chunks(SCAN_BATCH) {
                    let _: i64 =
                        bounded(self.config.command_timeout, "delete keys", conn.del(chunk)).await?;
                }
            }
            None => {
                bounded(
                    self.config.command_timeout,
                    "flush database",
                    redis::cmd("FLUSHDB").query_async::<()>(&mut conn),
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Counts entries under the prefix with SCAN; meant for operators, not health checks
    async fn size(&self) -> Result<usize, DomainError> {
        match &self.config.key_prefix {
            Some(_) => Ok(self.scan_prefixed().await?.len()),
            None => {
                let mut conn = self.connection.clone();
                bounded(
                    self.config.command_timeout,
                    "get database size",
                    redis::cmd("DBSIZE").query_async(&mut conn),
                )
                .await
            }
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let reply: String = bounded(
            self.config.command_timeout,
            "ping",
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(DomainError::cache(format!("Unexpected PING reply: {}", reply)))
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Runs one Redis command, failing with a cache error after `timeout`.
///
/// `ConnectionManager` only bounds the initial connect, so a backend that
/// stops answering would otherwise stall every caller.
async fn bounded<T, F>(timeout: Duration, action: &str, command: F) -> Result<T, DomainError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, command).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DomainError::cache(format!("Failed to {}: {}", action, e))),
        Err(_) => Err(DomainError::cache(format!(
            "Timed out after {}ms trying to {}",
            timeout.as_millis(),
            action
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("npmx-test")
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = RedisCacheConfig::new("redis://kv:6379").with_token("secret-token");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_hung_command_times_out_as_cache_error() {
        let hung = std::future::pending::<RedisResult<Option<String>>>();

        let err = bounded(Duration::from_millis(20), "get key 'k'", hung)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cache { .. }));
        assert!(err.to_string().contains("Timed out after 20ms trying to get key 'k'"));
    }

    #[tokio::test]
    async fn test_command_error_is_cache_error() {
        let failed = async {
            RedisResult::<()>::Err(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection reset",
            )))
        };

        let err = bounded(Duration::from_secs(1), "set key 'k'", failed)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cache { .. }));
        assert!(err.to_string().contains("Failed to set key 'k'"));
    }

    #[tokio::test]
    async fn test_completed_command_passes_through() {
        let done = async { RedisResult::Ok(7_i64) };
        assert_eq!(bounded(Duration::from_secs(1), "ttl", done).await.unwrap(), 7);
    }

    #[test]
    fn test_command_timeout_default() {
        let config = RedisCacheConfig::default();
        assert_eq!(config.command_timeout, Duration::from_secs(2));

        let config = config.with_command_timeout(Duration::from_millis(250));
        assert_eq!(config.command_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_invalid_url_is_cache_error() {
        let result = RedisCache::new(RedisCacheConfig::new("not a url")).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        cache.ping().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("ttl_key", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let ttl = cache.ttl("ttl_key").await.unwrap().unwrap();
        assert!(ttl.as_secs() > 50 && ttl.as_secs() <= 60);

        cache.delete("ttl_key").await.unwrap();
    }
}
