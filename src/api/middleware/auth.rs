//! Bearer token authentication for the internal API.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header::WWW_AUTHENTICATE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_auth::AuthBearer;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{error::AppError, state::AppState};

/// Authenticates requests against the configured `INTERNAL_API_TOKEN`.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Both tokens are digested before comparison, so the check runs in constant
/// time regardless of where or whether their lengths differ.
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if the header is
/// missing, malformed, or carries the wrong token.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let token = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => token,
        Err(_) => return unauthorized("Authorization header is missing or invalid"),
    };

    if !tokens_match(&token, &st.internal_api_token) {
        tracing::warn!("Rejected internal API request with invalid token");
        return unauthorized("Invalid token");
    }

    next.run(Request::from_parts(parts, body)).await
}

fn tokens_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.as_slice().ct_eq(expected.as_slice()).into()
}

fn unauthorized(reason: &str) -> Response {
    let mut response =
        AppError::unauthorized("Unauthorized", serde_json::json!({ "reason": reason }))
            .into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}
