//! HTTP client for the npmx API

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::X_CACHE;
use crate::domain::{CacheStatus, DomainError, FetchResult, PackageName, PackageSpec};
use crate::infrastructure::services::{ChangelogInfo, JsrPackageInfo, PackageLikes, Readme};

/// Service label for errors raised by this client
pub const API_SERVICE: &str = "npmx-api";

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Calls the cached routes and reports how each response was served
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::from_client(client, base_url))
    }

    pub fn from_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an API path. `X-Cache: STALE` marks the result stale.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchResult<T>, DomainError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(url = %url, "Calling npmx API");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DomainError::upstream(API_SERVICE, format!("Request failed: {}", e)))?;

        let status = response.status();
        let cache_status = response
            .headers()
            .get(X_CACHE)
            .and_then(|v| v.to_str().ok())
            .and_then(CacheStatus::from_header_value)
            .unwrap_or(CacheStatus::Miss);

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));

            return Err(error_for_status(status, message));
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| DomainError::upstream(API_SERVICE, format!("Failed to parse response: {}", e)))?;

        Ok(FetchResult::new(data, cache_status))
    }

    pub async fn packument(&self, name: &PackageName) -> Result<FetchResult<Value>, DomainError> {
        self.get(&format!("api/registry/{}", name), &[]).await
    }

    pub async fn readme(&self, spec: &PackageSpec) -> Result<FetchResult<Readme>, DomainError> {
        self.get(&format!("api/registry/readme/{}", spec_path(spec)), &[])
            .await
    }

    pub async fn changelog_info(
        &self,
        spec: &PackageSpec,
    ) -> Result<FetchResult<Option<ChangelogInfo>>, DomainError> {
        self.get(&format!("api/changelog/info/{}", spec_path(spec)), &[])
            .await
    }

    pub async fn jsr_info(&self, name: &PackageName) -> Result<FetchResult<JsrPackageInfo>, DomainError> {
        self.get(&format!("api/jsr/{}", name), &[]).await
    }

    pub async fn likes(&self, name: &PackageName) -> Result<FetchResult<PackageLikes>, DomainError> {
        self.get(&format!("api/social/likes/{}", name), &[]).await
    }
}

/// Route tail for a package spec: `name` or `name/v/version`
fn spec_path(spec: &PackageSpec) -> String {
    match spec.version_str() {
        Some(version) => format!("{}/v/{}", spec.name, version),
        None => spec.name.to_string(),
    }
}

fn error_for_status(status: StatusCode, message: String) -> DomainError {
    match status {
        StatusCode::BAD_REQUEST => DomainError::validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::unauthorized(message),
        StatusCode::NOT_FOUND => DomainError::not_found(message),
        _ => DomainError::upstream_status(API_SERVICE, status.as_u16(), message),
    }
}
