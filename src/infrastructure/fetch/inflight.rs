//! In-flight request registry
//!
//! Maps a cache key to the single outstanding fetch for that key. The
//! fetch runs in its own task so callers that stop waiting never cancel
//! it; the entry is removed when the task finishes, even on panic.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use crate::domain::DomainError;

/// Handle to an in-flight fetch, awaitable by any number of callers
pub type SharedFetch = Shared<BoxFuture<'static, Result<Value, DomainError>>>;

/// Outcome of joining the registry
pub struct Flight {
    pub fetch: SharedFetch,
    /// True when this caller started the fetch
    pub started: bool,
}

#[derive(Clone, Default)]
pub struct InflightRegistry {
    flights: Arc<Mutex<HashMap<String, SharedFetch>>>,
}

impl std::fmt::Debug for InflightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflightRegistry")
            .field("in_flight", &self.len())
            .finish()
    }
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the fetch running for `key`, or spawns `task` as the new one.
    ///
    /// Registration happens under the lock before the task can make
    /// progress, so two callers can never both start a fetch for one key.
    pub fn join_or_start<F>(&self, key: &str, task: F) -> Flight
    where
        F: Future<Output = Result<Value, DomainError>> + Send + 'static,
    {
        let mut flights = self.lock();

        if let Some(existing) = flights.get(key) {
            return Flight {
                fetch: existing.clone(),
                started: false,
            };
        }

        let guard = FlightGuard {
            registry: self.clone(),
            key: key.to_string(),
        };

        let handle = tokio::spawn(async move {
            let _guard = guard;
            task.await
        });

        let fetch = async move {
            handle.await.unwrap_or_else(|e| {
                Err(DomainError::internal(format!("Fetch task failed: {}", e)))
            })
        }
        .boxed()
        .shared();

        flights.insert(key.to_string(), fetch.clone());

        Flight {
            fetch,
            started: true,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedFetch>> {
        self.flights.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Removes the registry entry when the fetch task ends
struct FlightGuard {
    registry: InflightRegistry,
    key: String,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_caller_joins_existing_flight() {
        let registry = InflightRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let make_task = |runs: Arc<AtomicUsize>| async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!("done"))
        };

        let first = registry.join_or_start("k", make_task(runs.clone()));
        let second = registry.join_or_start("k", make_task(runs.clone()));

        assert!(first.started);
        assert!(!second.started);
        assert!(registry.contains("k"));

        let (a, b) = tokio::join!(first.fetch, second.fetch);
        assert_eq!(a.unwrap(), json!("done"));
        assert_eq!(b.unwrap(), json!("done"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let registry = InflightRegistry::new();

        let flight = registry.join_or_start("k", async { Ok(json!(1)) });
        flight.fetch.await.unwrap();

        assert!(!registry.contains("k"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_entry_removed_after_failure() {
        let registry = InflightRegistry::new();

        let flight = registry.join_or_start("k", async { Err(DomainError::upstream("npm", "boom")) });
        assert!(flight.fetch.await.is_err());
        assert!(!registry.contains("k"));
    }

    #[tokio::test]
    async fn test_entry_removed_after_panic() {
        let registry = InflightRegistry::new();

        let flight = registry.join_or_start("k", async {
            if true {
                panic!("producer panicked");
            }
            Ok(json!(null))
        });

        let result = flight.fetch.await;
        assert!(matches!(result, Err(DomainError::Internal { .. })));
        assert!(!registry.contains("k"));
    }

    #[tokio::test]
    async fn test_dropping_waiters_does_not_cancel_fetch() {
        let registry = InflightRegistry::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let flight = registry.join_or_start("k", async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(1))
        });
        drop(flight);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let registry = InflightRegistry::new();

        let a = registry.join_or_start("a", async { Ok(json!("a")) });
        let b = registry.join_or_start("b", async { Ok(json!("b")) });

        assert!(a.started && b.started);
        assert_eq!(a.fetch.await.unwrap(), json!("a"));
        assert_eq!(b.fetch.await.unwrap(), json!("b"));
    }
}
