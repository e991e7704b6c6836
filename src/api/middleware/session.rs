//! Session extractor for signed-in routes

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::Session;

/// Extractor that requires a stored session
///
/// The session id is read from:
/// - the session cookie (`npmx_session` unless configured otherwise)
/// - Authorization header: `Bearer <session_id>`
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = extract_session_id(&parts.headers, &state.session_cookie)
            .ok_or_else(|| ApiError::unauthorized("Sign in required"))?;

        let session = state
            .sessions
            .get(&session_id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load session");
                ApiError::unavailable("Session storage unavailable")
            })?
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))?;

        debug!(did = %session.did, "Session resolved");

        Ok(RequireSession(session))
    }
}

/// Session id from the cookie, falling back to a bearer token
pub fn extract_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}
