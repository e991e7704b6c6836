//! Gravatar lookup route

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;

use super::bypass;
use crate::api::cached::{CachedResponse, CachedRoute};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::CacheKeyParams;
use crate::infrastructure::services::gravatar_hash;

pub const GRAVATAR: CachedRoute =
    CachedRoute::new("gravatar", 86_400, "Failed to look up Gravatar");

/// GET /api/gravatar?email=
///
/// Keyed by the email hash so the address itself never reaches the cache.
pub async fn get_gravatar(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let email = query
        .get("email")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("Missing 'email' query parameter"))?;
    let hash = gravatar_hash(&email)?;

    let bypass = bypass(&GRAVATAR, &state, &query, &headers);
    let service = state.gravatar.clone();

    GRAVATAR
        .serve(&state, CacheKeyParams::new(&hash), bypass, move || async move {
            service.lookup(&email).await
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
    use crate::domain::CacheStatus;
    use crate::domain::fetch::MockUpstream;

    const HASH: &str = "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b";

    async fn call(state: &AppState, email: Option<&str>) -> Result<CachedResponse, ApiError> {
        let query = email
            .map(|email| HashMap::from([("email".to_string(), email.to_string())]))
            .unwrap_or_default();

        get_gravatar(State(state.clone()), Query(query), HeaderMap::new()).await
    }

    #[tokio::test]
    async fn test_lookup_and_case_insensitive_key() {
        let avatar = format!("{}/avatar/{}", UPSTREAM, HASH);
        let upstream = Arc::new(MockUpstream::new().with_response(&avatar, json!(true)));
        let state = state_with(upstream.clone());

        let first = call(&state, Some("test@example.com")).await.unwrap();
        let second = call(&state, Some("  Test@Example.COM ")).await.unwrap();

        assert_eq!(first.body, json!({"hash": HASH, "url": avatar, "exists": true}));
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(upstream.calls(&avatar), 1);
    }

    #[tokio::test]
    async fn test_missing_email() {
        let state = state_with(Arc::new(MockUpstream::new()));

        let err = call(&state, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_email() {
        let upstream = Arc::new(MockUpstream::new());
        let state = state_with(upstream.clone());

        let err = call(&state, Some("not-an-email")).await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(upstream.total_calls(), 0);
    }
}
