//! Session endpoints backed by remember-me credentials.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::web::extractors::RememberedUser;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

/// Returns the user recognised from the remember-me cookie.
///
/// # Endpoint
///
/// `GET /whoami`
///
/// # Errors
///
/// `401 Unauthorized` if the request was not remembered.
pub async fn whoami_handler(remembered: RememberedUser) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        user: remembered.user,
        expires_at: remembered.expires_at,
    })
}

/// Deletes the credential behind the presented cookie and clears it.
///
/// # Endpoint
///
/// `POST /logout`
///
/// Always answers `204 No Content` with a clearing `Set-Cookie`, including
/// when no valid cookie was presented.
///
/// # Errors
///
/// `503 Service Unavailable` if the store fails while deleting.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(Ok(cookie)) = state.cookie_codec.read(&headers) {
        state.remember_me.forget(&cookie).await?;
    }

    Ok(cleared(&state))
}

/// Revokes every credential of the remembered user and clears the cookie.
///
/// # Endpoint
///
/// `POST /logout-everywhere`
///
/// # Errors
///
/// - `401 Unauthorized` if the request was not remembered
/// - `503 Service Unavailable` if the store fails
pub async fn logout_everywhere_handler(
    State(state): State<AppState>,
    remembered: RememberedUser,
) -> Result<Response, AppError> {
    state.remember_me.revoke_user(&remembered.user).await?;
    Ok(cleared(&state))
}

fn cleared(state: &AppState) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, state.cookie_codec.clear_cookie())],
    )
        .into_response()
}
