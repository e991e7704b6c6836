//! Keyed async data resources
//!
//! An [`AsyncData`] owns one input, the key derived from it and the
//! reactive state of the last fetch. State is published on a
//! `tokio::sync::watch` channel so any number of observers can follow
//! `data`, `pending`, `error` and `is_stale`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::{DomainError, FetchResult};

/// Observable state of an [`AsyncData`]
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    pub pending: bool,
    pub error: Option<DomainError>,
    pub is_stale: bool,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            pending: false,
            error: None,
            is_stale: false,
        }
    }
}

type KeyFn<I> = Arc<dyn Fn(&I) -> String + Send + Sync>;
type FetchFn<I, T> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<FetchResult<T>, DomainError>> + Send + Sync>;

struct Current<I> {
    input: I,
    key: String,
    /// Bumped by every fetch or hydration; older results are dropped
    generation: u64,
    /// Set by a stale hydration until the first mount
    refresh_on_mount: bool,
}

struct Inner<I, T> {
    key_fn: KeyFn<I>,
    fetch_fn: FetchFn<I, T>,
    current: Mutex<Current<I>>,
    state: watch::Sender<AsyncState<T>>,
}

/// Reactive resource keyed by its input
pub struct AsyncData<I, T> {
    inner: Arc<Inner<I, T>>,
}

impl<I, T> Clone for AsyncData<I, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<I, T> std::fmt::Debug for AsyncData<I, T>
where
    I: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncData")
            .field("key", &self.key())
            .finish_non_exhaustive()
    }
}

impl<I, T> AsyncData<I, T>
where
    I: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an idle resource; nothing is fetched until [`refresh`](Self::refresh)
    pub fn new<K, F, Fut>(input: I, key_fn: K, fetch_fn: F) -> Self
    where
        K: Fn(&I) -> String + Send + Sync + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FetchResult<T>, DomainError>> + Send + 'static,
    {
        let key = key_fn(&input);
        let (state, _) = watch::channel(AsyncState::default());

        Self {
            inner: Arc::new(Inner {
                key_fn: Arc::new(key_fn),
                fetch_fn: Arc::new(move |input: I| fetch_fn(input).boxed()),
                current: Mutex::new(Current {
                    input,
                    key,
                    generation: 0,
                    refresh_on_mount: false,
                }),
                state,
            }),
        }
    }

    /// Observer of the state
    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T>> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the state
    pub fn state(&self) -> AsyncState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn input(&self) -> I {
        self.lock().input.clone()
    }

    pub fn key(&self) -> String {
        self.lock().key.clone()
    }

    /// Fetches the current input and publishes the result.
    ///
    /// When another fetch or hydration starts before this one finishes,
    /// this result is discarded.
    pub async fn refresh(&self) {
        let (input, key, generation) = {
            let mut current = self.lock();
            current.generation += 1;
            (current.input.clone(), current.key.clone(), current.generation)
        };

        self.inner.state.send_modify(|state| state.pending = true);
        debug!(key = %key, "Fetching async data");

        let result = (self.inner.fetch_fn)(input).await;

        // The lock is held while publishing so a newer fetch cannot start in between
        let current = self.lock();
        if current.generation != generation {
            debug!(key = %key, "Discarding superseded result");
            return;
        }

        self.inner.state.send_modify(|state| {
            state.pending = false;
            match result {
                Ok(result) => {
                    state.data = Some(result.data);
                    state.is_stale = result.is_stale;
                    state.error = None;
                }
                Err(e) => state.error = Some(e),
            }
        });
        drop(current);
    }

    /// Replaces the input. Fetches only when the derived key changes;
    /// a new key starts from empty state.
    ///
    /// Returns whether a fetch ran.
    pub async fn set_input(&self, input: I) -> bool {
        let key = (self.inner.key_fn)(&input);

        {
            let mut current = self.lock();
            if current.key == key {
                current.input = input;
                return false;
            }

            current.input = input;
            current.key = key;
            current.refresh_on_mount = false;

            // Data belongs to the old key
            self.inner.state.send_modify(|state| {
                state.data = None;
                state.is_stale = false;
                state.error = None;
            });
        }

        self.refresh().await;
        true
    }

    /// Seeds server-rendered data without fetching
    pub fn hydrate(&self, input: I, data: T, is_stale: bool) {
        let key = (self.inner.key_fn)(&input);

        let mut current = self.lock();
        current.input = input;
        current.key = key;
        current.generation += 1;
        current.refresh_on_mount = is_stale;

        self.inner.state.send_replace(AsyncState {
            data: Some(data),
            pending: false,
            error: None,
            is_stale,
        });
    }

    /// Client takeover after hydration: refreshes once if the hydrated
    /// data was stale. Returns whether a refresh ran.
    pub async fn mounted(&self) -> bool {
        let stale = std::mem::take(&mut self.lock().refresh_on_mount);

        if stale {
            self.refresh().await;
        }

        stale
    }

    fn lock(&self) -> MutexGuard<'_, Current<I>> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::domain::CacheStatus;

    /// Resource over strings whose key ignores case; counts fetches
    fn resource(calls: Arc<AtomicUsize>) -> AsyncData<String, String> {
        AsyncData::new(
            "vue".to_string(),
            |input: &String| input.to_lowercase(),
            move |input: String| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if input.starts_with("slow") {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    if input == "broken" {
                        return Err(DomainError::upstream("npmx-api", "HTTP 502"));
                    }
                    Ok(FetchResult::new(format!("data:{}", input), CacheStatus::Miss))
                }
            },
        )
    }

    #[tokio::test]
    async fn test_refresh_publishes_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let data = resource(calls.clone());

        assert_eq!(data.state(), AsyncState::default());

        data.refresh().await;

        let state = data.state();
        assert_eq!(state.data.as_deref(), Some("data:vue"));
        assert!(!state.pending);
        assert!(state.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_key_does_not_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let data = resource(calls.clone());

        assert!(!data.set_input("VUE".to_string()).await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(data.input(), "VUE");

        assert!(data.set_input("react".to_string()).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(data.state().data.as_deref(), Some("data:react"));
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let data = resource(calls.clone());

        let slow = {
            let data = data.clone();
            tokio::spawn(async move { data.set_input("slow-pkg".to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        data.set_input("fast".to_string()).await;
        slow.await.unwrap();

        let state = data.state();
        assert_eq!(state.data.as_deref(), Some("data:fast"));
        assert!(!state.pending);
        assert_eq!(data.key(), "fast");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pending_is_observable() {
        let data = resource(Arc::new(AtomicUsize::new(0)));
        let mut rx = data.subscribe();

        let task = {
            let data = data.clone();
            tokio::spawn(async move { data.set_input("slow-x".to_string()).await })
        };

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().pending);

        task.await.unwrap();
        assert!(!data.state().pending);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_data_of_same_key() {
        let data = resource(Arc::new(AtomicUsize::new(0)));

        data.hydrate("broken".to_string(), "server".to_string(), false);
        data.refresh().await;

        let state = data.state();
        assert_eq!(state.data.as_deref(), Some("server"));
        assert!(matches!(state.error, Some(DomainError::Upstream { .. })));
        assert!(!state.pending);
    }

    #[tokio::test]
    async fn test_new_key_failure_drops_old_data() {
        let data = resource(Arc::new(AtomicUsize::new(0)));

        data.refresh().await;
        assert_eq!(data.state().data.as_deref(), Some("data:vue"));

        data.set_input("broken".to_string()).await;

        let state = data.state();
        assert_eq!(data.key(), "broken");
        assert!(state.data.is_none());
        assert!(!state.is_stale);
        assert!(matches!(state.error, Some(DomainError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_new_key_clears_data_while_pending() {
        let data = resource(Arc::new(AtomicUsize::new(0)));
        data.hydrate("vue".to_string(), "server".to_string(), true);
        let mut rx = data.subscribe();

        let task = {
            let data = data.clone();
            tokio::spawn(async move { data.set_input("slow-z".to_string()).await })
        };

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert!(seen.data.is_none());
        assert!(!seen.is_stale);

        task.await.unwrap();
        assert_eq!(data.state().data.as_deref(), Some("data:slow-z"));
    }

    #[tokio::test]
    async fn test_fresh_hydration_never_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let data = resource(calls.clone());

        data.hydrate("vue".to_string(), "server".to_string(), false);

        assert!(!data.mounted().await);
        assert_eq!(data.state().data.as_deref(), Some("server"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_hydration_refreshes_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let data = resource(calls.clone());

        data.hydrate("vue".to_string(), "server".to_string(), true);
        assert!(data.state().is_stale);

        assert!(data.mounted().await);
        assert!(!data.mounted().await);

        let state = data.state();
        assert_eq!(state.data.as_deref(), Some("data:vue"));
        assert!(!state.is_stale);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hydration_discards_in_flight_fetch() {
        let data = resource(Arc::new(AtomicUsize::new(0)));

        let task = {
            let data = data.clone();
            tokio::spawn(async move { data.set_input("slow-y".to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        data.hydrate("slow-y".to_string(), "server".to_string(), false);
        task.await.unwrap();

        assert_eq!(data.state().data.as_deref(), Some("server"));
    }
}
