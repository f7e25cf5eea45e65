//! Request extractors for remembered users.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// The user recognised from a valid remember-me cookie.
///
/// Inserted into request extensions by
/// [`crate::web::middleware::remember_me::layer`]. Extracting it from a request
/// that was not remembered yields `401 Unauthorized`; use
/// `Option<RememberedUser>` for routes that also serve anonymous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedUser {
    pub user: String,
    pub selector: String,
    /// Expiration of the credential after this request's rotation.
    pub expires_at: DateTime<Utc>,
}

impl<S> FromRequestParts<S> for RememberedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::unauthorized(
                "Not remembered",
                serde_json::json!({ "reason": "no valid remember-me cookie" }),
            )
        })
    }
}

impl<S> OptionalFromRequestParts<S> for RememberedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned())
    }
}
