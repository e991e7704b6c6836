//! Cache domain - Generic caching abstraction layer

mod entry;
mod key;
mod repository;

pub use entry::CacheEntry;
pub use key::{CACHE_VERSION, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator, normalize_segment};
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
