//! Cache infrastructure - Cache implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheConfig, CacheFactory, CacheType, KV_TOKEN_ENV, KV_URL_ENV};
pub use in_memory::{DEFAULT_MAX_BYTES, InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
