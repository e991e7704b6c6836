//! Fetch domain - outbound requests, results and cancellation

mod abort;
mod request;
mod result;
mod upstream;

pub use abort::{AbortController, AbortSignal};
pub use request::{FetchFormat, FetchRequest};
pub use result::{CacheStatus, FetchPolicy, FetchResult};
pub use upstream::UpstreamClient;

#[cfg(test)]
pub use upstream::mock::MockUpstream;
