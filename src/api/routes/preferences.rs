//! Signed-in user preferences

use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::{debug, info};

use crate::api::middleware::RequireSession;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::UserPreferences;

/// Preferences are per user and must never be stored by shared caches
const PRIVATE_NO_STORE: HeaderValue = HeaderValue::from_static("private, no-store");

/// GET /api/user/preferences
///
/// Users who never saved anything get the defaults.
pub async fn get_preferences(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Result<Response, ApiError> {
    debug!(did = %session.did, "Getting preferences");

    let preferences = state
        .preferences
        .get(&session.did)
        .await?
        .unwrap_or_default();

    Ok(private(preferences))
}

/// PUT /api/user/preferences
pub async fn put_preferences(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Json(preferences): Json<UserPreferences>,
) -> Result<Response, ApiError> {
    preferences.validate()?;

    let preferences = preferences.touched(Utc::now());
    state.preferences.save(&session.did, &preferences).await?;

    info!(did = %session.did, "Preferences saved");

    Ok(private(preferences))
}

fn private(preferences: UserPreferences) -> Response {
    let mut response = Json(preferences).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, PRIVATE_NO_STORE);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::api::state::test_support::state_with;
    use crate::domain::fetch::MockUpstream;
    use crate::domain::preferences::{ColorMode, PackageManager};
    use crate::domain::{Did, Session};

    async fn signed_in() -> (AppState, Session) {
        let state = state_with(Arc::new(MockUpstream::new()));
        let session = Session::new("s1", Did::new("did:plc:abc").unwrap(), "alice.test");
        state.sessions.save(&session).await.unwrap();
        (state, session)
    }

    #[tokio::test]
    async fn test_defaults_for_new_user() {
        let (state, session) = signed_in().await;

        let response = get_preferences(State(state), RequireSession(session))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "private, no-store");
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (state, session) = signed_in().await;
        let preferences = UserPreferences {
            color_mode: ColorMode::Dark,
            package_manager: PackageManager::Pnpm,
            ..Default::default()
        };

        put_preferences(
            State(state.clone()),
            RequireSession(session.clone()),
            Json(preferences),
        )
        .await
        .unwrap();

        let stored = state.preferences.get(&session.did).await.unwrap().unwrap();
        assert_eq!(stored.color_mode, ColorMode::Dark);
        assert_eq!(stored.package_manager, PackageManager::Pnpm);
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_preferences() {
        let (state, session) = signed_in().await;
        let preferences = UserPreferences {
            accent_color_id: Some("chartreuse".to_string()),
            ..Default::default()
        };

        let err = put_preferences(State(state.clone()), RequireSession(session.clone()), Json(preferences))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.preferences.get(&session.did).await.unwrap().is_none());
    }
}
