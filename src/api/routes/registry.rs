//! npm registry proxy routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use tracing::debug;

use super::bypass;
use crate::api::cached::{CachedResponse, CachedRoute};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{CacheKeyParams, PackageName, PackageSpec};

pub const REGISTRY: CachedRoute =
    CachedRoute::new("registry", 300, "Failed to fetch package from npm registry");

pub const README: CachedRoute = CachedRoute::new("readme", 3600, "Failed to fetch README");

/// GET /api/registry/{pkg} and GET /api/registry/readme/{pkg}[/v/{version}]
///
/// Scoped names contain a slash, so both routes share one wildcard.
pub async fn get_registry(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    match path.strip_prefix("readme/") {
        Some(rest) => readme(state, rest, &query, &headers).await,
        None => packument(state, &path, &query, &headers).await,
    }
}

async fn packument(
    state: AppState,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let name = PackageName::new(path.trim_matches('/'))?;
    debug!(package = %name, "Getting packument");

    let bypass = bypass(&REGISTRY, &state, query, headers);
    let registry = state.registry.clone();

    REGISTRY
        .serve(&state, CacheKeyParams::new(&name), bypass, move || async move {
            registry.packument(&name).await
        })
        .await
}

async fn readme(
    state: AppState,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let spec = PackageSpec::parse_path(path)?;
    debug!(package = %spec, "Getting README");

    let params = CacheKeyParams::new(&spec.name).with_optional_component("v", spec.version_str());
    let bypass = bypass(&README, &state, query, headers);
    let service = state.readme.clone();

    README
        .serve(&state, params, bypass, move || async move {
            service.readme(&spec).await
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::state::test_support::{UPSTREAM, state_with};
    use crate::domain::{CacheStatus, DomainError};
    use crate::domain::fetch::MockUpstream;

    fn no_query() -> Query<HashMap<String, String>> {
        Query(HashMap::new())
    }

    async fn get(state: &AppState, path: &str) -> Result<CachedResponse, ApiError> {
        get_registry(
            State(state.clone()),
            Path(path.to_string()),
            no_query(),
            HeaderMap::new(),
        )
        .await
    }

    #[tokio::test]
    async fn test_packument_is_cached() {
        let upstream = Arc::new(
            MockUpstream::new()
                .with_response(&format!("{}/vue", UPSTREAM), json!({"name": "vue"})),
        );
        let state = state_with(upstream.clone());

        let first = get(&state, "vue").await.unwrap();
        let second = get(&state, "vue/").await.unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.body, json!({"name": "vue"}));
        assert_eq!(upstream.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_scoped_packument_url() {
        let url = format!("{}/@vue%2Fcore", UPSTREAM);
        let upstream = Arc::new(MockUpstream::new().with_response(&url, json!({"name": "@vue/core"})));
        let state = state_with(upstream.clone());

        let response = get(&state, "@vue/core").await.unwrap();

        assert_eq!(response.body["name"], "@vue/core");
        assert_eq!(upstream.calls(&url), 1);
    }

    #[tokio::test]
    async fn test_bypass_refetches() {
        let url = format!("{}/vue", UPSTREAM);
        let upstream = Arc::new(MockUpstream::new().with_response(&url, json!({"rev": 1})));
        let state = state_with(upstream.clone());

        get(&state, "vue").await.unwrap();
        upstream.set_response(&url, Ok(json!({"rev": 2})));

        let bypassed = get_registry(
            State(state.clone()),
            Path("vue".to_string()),
            Query(HashMap::from([("registry".to_string(), String::new())])),
            HeaderMap::new(),
        )
        .await
        .unwrap();
        let cached = get(&state, "vue").await.unwrap();

        assert_eq!(bypassed.status, CacheStatus::Bypass);
        assert_eq!(bypassed.body, json!({"rev": 2}));
        assert_eq!(cached.body, json!({"rev": 2}));
        assert_eq!(upstream.calls(&url), 2);
    }

    #[tokio::test]
    async fn test_invalid_name_is_rejected_without_fetch() {
        let upstream = Arc::new(MockUpstream::new());
        let state = state_with(upstream.clone());

        let err = get(&state, "Not A Package").await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(upstream.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_uses_fixed_message() {
        let url = format!("{}/vue", UPSTREAM);
        let upstream = Arc::new(
            MockUpstream::new().with_error(&url, DomainError::upstream_status("npm", 500, "trace")),
        );
        let state = state_with(upstream);

        let err = get(&state, "vue").await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "Failed to fetch package from npm registry");
    }

    #[tokio::test]
    async fn test_readme_from_packument() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            &format!("{}/vue", UPSTREAM),
            json!({"name": "vue", "dist-tags": {"latest": "3.5.0"}, "readme": "# Vue"}),
        ));
        let state = state_with(upstream);

        let response = get(&state, "readme/vue").await.unwrap();

        assert_eq!(response.body["markdown"], "# Vue");
        assert_eq!(response.status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn test_package_named_readme() {
        let upstream = Arc::new(
            MockUpstream::new()
                .with_response(&format!("{}/readme", UPSTREAM), json!({"name": "readme"})),
        );
        let state = state_with(upstream);

        let response = get(&state, "readme").await.unwrap();

        assert_eq!(response.body["name"], "readme");
    }

    #[test]
    fn test_route_rules() {
        assert_eq!(REGISTRY.max_age.as_secs(), 300);
        assert_eq!(README.max_age.as_secs(), 3600);
        assert!(REGISTRY.swr && README.swr);
    }
}
