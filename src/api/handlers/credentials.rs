//! Handlers for the internal credential endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::api::dto::credentials::{IssueCredentialRequest, IssueCredentialResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::selector::is_valid_selector;

/// Issues a remember-me credential for a user who just logged in.
///
/// # Endpoint
///
/// `POST /api/credentials`
///
/// # Request Body
///
/// ```json
/// { "user": "alice" }
/// ```
///
/// # Response
///
/// `201 Created` with a `Set-Cookie` header and:
///
/// ```json
/// {
///   "user": "alice",
///   "selector": "q3Xl0v6m2kq3Y0bR1c8sWn3A",
///   "expires_at": "2026-11-18T10:00:00Z",
///   "cookie_name": "remember_me",
///   "cookie_value": "eyJ2IjoxLC....",
///   "max_age": 2592000
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request` if the user is empty or contains control characters
/// - `503 Service Unavailable` if the store or the entropy source fails
pub async fn issue_credential_handler(
    State(state): State<AppState>,
    Json(payload): Json<IssueCredentialRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let issued = state.remember_me.issue(&payload.user).await?;

    let body = IssueCredentialResponse {
        user: issued.user,
        selector: issued.cookie.selector.clone(),
        expires_at: issued.expires_at,
        cookie_name: issued.cookie.cookie_name.clone(),
        cookie_value: state.cookie_codec.encode(&issued.cookie),
        max_age: issued.cookie.max_age.as_secs(),
    };

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, state.cookie_codec.set_cookie(&issued.cookie))],
        Json(body),
    )
        .into_response())
}

/// Revokes a single credential.
///
/// # Endpoint
///
/// `DELETE /api/credentials/{selector}`
///
/// Idempotent: unknown selectors also return `204 No Content`.
///
/// # Errors
///
/// - `400 Bad Request` if the selector has the wrong shape
/// - `503 Service Unavailable` if the store fails
pub async fn revoke_credential_handler(
    State(state): State<AppState>,
    Path(selector): Path<String>,
) -> Result<StatusCode, AppError> {
    if !is_valid_selector(&selector) {
        return Err(AppError::bad_request(
            "Invalid selector",
            serde_json::json!({ "selector": selector }),
        ));
    }

    state.remember_me.revoke_selector(&selector).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revokes every credential of a user ("log out everywhere").
///
/// # Endpoint
///
/// `DELETE /api/users/{user}/credentials`
///
/// # Errors
///
/// - `503 Service Unavailable` if the store fails
pub async fn revoke_user_credentials_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<StatusCode, AppError> {
    state.remember_me.revoke_user(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
