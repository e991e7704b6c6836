//! Upstream client abstraction

use async_trait::async_trait;
use serde_json::Value;

use super::FetchRequest;
use crate::domain::DomainError;

/// Performs outbound fetches against external services
///
/// Implementations map HTTP 404 to [`DomainError::NotFound`] (except for
/// [`FetchFormat::Exists`](super::FetchFormat::Exists) requests, which
/// yield `false`) and any other non-success status or transport failure to
/// [`DomainError::Upstream`].
#[async_trait]
pub trait UpstreamClient: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Upstream mock returning canned responses per URL, counting calls
    #[derive(Debug, Default)]
    pub struct MockUpstream {
        responses: Mutex<HashMap<String, Result<Value, DomainError>>>,
        calls: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockUpstream {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delays every response, widening the window for concurrent callers
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn with_response(self, url: &str, value: Value) -> Self {
            self.set_response(url, Ok(value));
            self
        }

        pub fn with_error(self, url: &str, error: DomainError) -> Self {
            self.set_response(url, Err(error));
            self
        }

        pub fn set_response(&self, url: &str, response: Result<Value, DomainError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamClient for MockUpstream {
        async fn fetch(&self, request: &FetchRequest) -> Result<Value, DomainError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self
                .calls
                .lock()
                .unwrap()
                .entry(request.url.clone())
                .or_insert(0) += 1;

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.responses
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Err(DomainError::not_found(format!("No mock for {}", request.url))))
        }
    }
}
