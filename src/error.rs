//! Error types for the remember-me core and the HTTP boundary.
//!
//! [`RememberMeError`] is the taxonomy used by tokens, stores and the service.
//! Every variant is recoverable at the request boundary: none of them should
//! terminate the process. [`AppError`] turns them into JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

/// Errors raised by the remember-me token lifecycle and credential stores.
#[derive(Debug, thiserror::Error)]
pub enum RememberMeError {
    /// The OS entropy source failed. Aborts issuing or rotating a credential.
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// No live record for the selector. The request is simply not remembered.
    #[error("remember-me credential not found")]
    NotFound,

    /// The backing store could not be reached or rejected the operation.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// The transport cookie could not be decoded or has the wrong shape.
    #[error("malformed remember-me cookie: {0}")]
    Malformed(String),

    /// The presented validator did not match the stored hash.
    ///
    /// By the time this is returned the affected credentials have already
    /// been revoked.
    #[error("remember-me validator mismatch")]
    ValidatorMismatch,
}

impl RememberMeError {
    /// Returns true for errors that mean "this request is not remembered"
    /// and the client cookie should be discarded.
    pub fn is_not_remembered(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Malformed(_) | Self::ValidatorMismatch
        )
    }

    /// Stable machine-readable kind, used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomnessUnavailable(_) => "randomness_unavailable",
            Self::NotFound => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Malformed(_) => "malformed",
            Self::ValidatorMismatch => "validator_mismatch",
        }
    }
}

impl From<sqlx::Error> for RememberMeError {
    fn from(e: sqlx::Error) -> Self {
        Self::StoreUnavailable(format!("database error: {e}"))
    }
}

impl From<redis::RedisError> for RememberMeError {
    fn from(e: redis::RedisError) -> Self {
        Self::StoreUnavailable(format!("redis error: {e}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

/// Error returned by HTTP handlers and middleware.
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Unavailable { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Unavailable { message, .. } => f.write_str(message),
        }
    }
}

impl From<RememberMeError> for AppError {
    fn from(e: RememberMeError) -> Self {
        let details = json!({ "reason": e.kind() });
        match e {
            RememberMeError::NotFound
            | RememberMeError::Malformed(_)
            | RememberMeError::ValidatorMismatch => AppError::unauthorized("Not remembered", details),
            RememberMeError::StoreUnavailable(_) => {
                AppError::unavailable("Credential store unavailable", details)
            }
            RememberMeError::RandomnessUnavailable(_) => {
                AppError::unavailable("Secure randomness unavailable", details)
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&e).unwrap_or(Value::Null);
        AppError::bad_request("Validation failed", details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::Unauthorized { message, details } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message, details)
            }
            AppError::Unavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                message,
                details,
            ),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}
