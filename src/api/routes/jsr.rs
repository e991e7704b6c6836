//! JSR availability route

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;

use super::bypass;
use crate::api::cached::{CachedResponse, CachedRoute};
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{CacheKeyParams, PackageName};

pub const JSR: CachedRoute = CachedRoute::new("jsr", 3600, "Failed to check JSR");

/// GET /api/jsr/{pkg}
pub async fn get_jsr_info(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<CachedResponse, ApiError> {
    let name = PackageName::new(path.trim_matches('/'))?;
    let bypass = bypass(&JSR, &state, &query, &headers);
    let service = state.jsr.clone();

    JSR.serve(&state, CacheKeyParams::new(&name), bypass, move || async move {
        service.info(&name).await
    })
    .await
}
