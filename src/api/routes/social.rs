//! Social (AT Protocol) routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;

use super::bypass;
use crate::api::cached::{CachedResponse, CachedRoute};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{CacheKeyParams, PackageName};

pub const LIKES: CachedRoute = CachedRoute::new("likes", 60, "Failed to fetch likes");

/// GET /api/social/likes/{pkg}
pub async fn get_likes(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let name = PackageName::new(path.trim_matches('/'))?;
    let bypass = bypass(&LIKES, &state, &query, &headers);
    let service = state.likes.clone();

    LIKES
        .serve(&state, CacheKeyParams::new(&name), bypass, move || async move {
            service.likes(&name).await
        })
        .await
}
