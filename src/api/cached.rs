//! Cached route handlers
//!
//! A [`CachedRoute`] wraps a route producer with the cached fetcher: it
//! derives the route's cache key, honors the bypass switch, sets caching
//! headers and turns failures into the route's fixed error response.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::config::CacheSettings;
use crate::domain::cache::{CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::domain::fetch::{CacheStatus, FetchPolicy, FetchResult};
use crate::domain::DomainError;

/// Response header reporting how the body was served
pub const X_CACHE: &str = "x-cache";

/// Caching rules of one route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRoute {
    /// Key namespace and bypass switch name
    pub name: &'static str,
    pub max_age: Duration,
    pub swr: bool,
    pub failure_status: StatusCode,
    pub failure_message: &'static str,
}

impl CachedRoute {
    pub const fn new(name: &'static str, max_age_secs: u64, failure_message: &'static str) -> Self {
        Self {
            name,
            max_age: Duration::from_secs(max_age_secs),
            swr: true,
            failure_status: StatusCode::BAD_GATEWAY,
            failure_message,
        }
    }

    pub const fn swr(mut self, enabled: bool) -> Self {
        self.swr = enabled;
        self
    }

    pub const fn failure_status(mut self, status: StatusCode) -> Self {
        self.failure_status = status;
        self
    }

    /// Versioned cache key for this route
    pub fn key(&self, params: &CacheKeyParams) -> String {
        DefaultKeyGenerator::new().generate_with_namespace(self.name, params)
    }

    pub fn policy(&self, settings: &CacheSettings, bypass: bool) -> FetchPolicy {
        FetchPolicy::with_ttl(self.max_age)
            .swr(self.swr)
            .stale_window(settings.stale_window())
            .bypass(bypass)
    }

    /// Whether the request asks to skip the cache read.
    ///
    /// The switch is a query parameter or header named exactly after the
    /// route. With a configured secret its value must match the secret.
    pub fn is_bypass(
        &self,
        query: &HashMap<String, String>,
        headers: &HeaderMap,
        secret: Option<&str>,
    ) -> bool {
        let from_query = query.get(self.name).map(String::as_str);
        let from_header = headers.get(self.name).and_then(|v| v.to_str().ok());

        match secret {
            Some(secret) => [from_query, from_header]
                .into_iter()
                .flatten()
                .any(|value| value == secret),
            None => from_query.is_some() || from_header.is_some(),
        }
    }

    /// `Cache-Control` value advertised for this route's responses
    pub fn cache_control(&self, settings: &CacheSettings) -> String {
        if self.swr {
            format!(
                "public, max-age={}, stale-while-revalidate={}",
                self.max_age.as_secs(),
                settings.stale_window_secs
            )
        } else {
            format!("public, max-age={}", self.max_age.as_secs())
        }
    }

    /// Runs `producer` through the cache under this route's key
    pub async fn fetch<T, F, Fut>(
        &self,
        state: &AppState,
        params: CacheKeyParams,
        bypass: bool,
        producer: F,
    ) -> Result<FetchResult<Value>, ApiError>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        let key = self.key(&params);
        let policy = self.policy(&state.cache_settings, bypass);

        if bypass {
            info!(route = self.name, key = %key, "Cache bypass requested");
        }

        state
            .fetcher
            .get_or_fetch(&key, policy, None, move || async move {
                let data = producer().await?;
                serde_json::to_value(data)
                    .map_err(|e| DomainError::internal(format!("Failed to encode response: {}", e)))
            })
            .await
            .map_err(|e| self.failure(e))
    }

    /// Fetches and renders the response in one step
    pub async fn serve<T, F, Fut>(
        &self,
        state: &AppState,
        params: CacheKeyParams,
        bypass: bool,
        producer: F,
    ) -> Result<CachedResponse, ApiError>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        let result = self.fetch(state, params, bypass, producer).await?;
        Ok(self.respond(&state.cache_settings, result))
    }

    pub fn respond(&self, settings: &CacheSettings, result: FetchResult<Value>) -> CachedResponse {
        CachedResponse {
            body: result.data,
            status: result.status,
            cache_control: self.cache_control(settings),
        }
    }

    /// Client errors keep their message; anything else is logged and
    /// replaced with the route's fixed response.
    pub fn failure(&self, err: DomainError) -> ApiError {
        match &err {
            DomainError::Validation { .. }
            | DomainError::NotFound { .. }
            | DomainError::Unauthorized { .. } => err.into(),
            _ => {
                error!(route = self.name, error = %err, "Route handler failed");
                ApiError::with_status(self.failure_status, self.failure_message)
            }
        }
    }
}

/// JSON body plus caching headers
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: Value,
    pub status: CacheStatus,
    pub cache_control: String,
}

impl CachedResponse {
    pub fn map_body(mut self, f: impl FnOnce(Value) -> Value) -> Self {
        self.body = f(self.body);
        self
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = axum::Json(self.body).into_response();
        let headers = response.headers_mut();

        headers.insert(
            X_CACHE,
            HeaderValue::from_static(self.status.as_header_value()),
        );

        if let Ok(value) = HeaderValue::from_str(&self.cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }

        response
    }
}
