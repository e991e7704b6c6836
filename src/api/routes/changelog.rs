//! Changelog detection routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde_json::json;

use super::bypass;
use crate::api::cached::{CachedResponse, CachedRoute};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{CacheKeyParams, PackageSpec};

pub const CHANGELOG: CachedRoute =
    CachedRoute::new("changelog", 3600, "Failed to detect changelog");

/// GET /api/changelog/info/{pkg}[/v/{version}]
pub async fn get_changelog_info(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    changelog_info(&state, &path, &query, &headers).await
}

/// GET /api/changelog/has/{pkg}[/v/{version}]
///
/// Shares the info route's cache entry.
pub async fn has_changelog(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let response = changelog_info(&state, &path, &query, &headers).await?;

    Ok(response.map_body(|info| json!({ "hasChangelog": !info.is_null() })))
}

async fn changelog_info(
    state: &AppState,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let spec = PackageSpec::parse_path(path)?;
    let params = CacheKeyParams::new(&spec.name).with_optional_component("v", spec.version_str());
    let bypass = bypass(&CHANGELOG, state, query, headers);
    let service = state.changelog.clone();

    CHANGELOG
        .serve(state, params, bypass, move || async move {
            service.info(&spec).await
        })
        .await
}
