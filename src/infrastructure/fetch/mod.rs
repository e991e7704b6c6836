//! Cached remote fetch - coalescing and stale-while-revalidate

mod cached_fetch;
mod inflight;

pub use cached_fetch::{CachedFetcher, FETCH_NAMESPACE};
pub use inflight::{Flight, InflightRegistry, SharedFetch};
