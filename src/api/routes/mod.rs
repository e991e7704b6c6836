//! Cached API routes under `/api`

pub mod changelog;
pub mod gravatar;
pub mod jsr;
pub mod preferences;
pub mod registry;
pub mod social;

use std::collections::HashMap;

use axum::{Router, http::HeaderMap, routing::get};

use super::cached::CachedRoute;
use super::state::AppState;

/// Create the `/api` router
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/registry/{*path}", get(registry::get_registry))
        .route("/changelog/info/{*path}", get(changelog::get_changelog_info))
        .route("/changelog/has/{*path}", get(changelog::has_changelog))
        .route("/jsr/{*path}", get(jsr::get_jsr_info))
        .route("/gravatar", get(gravatar::get_gravatar))
        .route("/social/likes/{*path}", get(social::get_likes))
        .route(
            "/user/preferences",
            get(preferences::get_preferences).put(preferences::put_preferences),
        )
}

/// Whether this request switches off the cache read for `route`
fn bypass(
    route: &CachedRoute,
    state: &AppState,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> bool {
    route.is_bypass(query, headers, state.cache_settings.bypass_secret.as_deref())
}
