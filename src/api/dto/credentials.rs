//! DTOs for the internal credential endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request to issue a remember-me credential after a successful password login.
#[derive(Debug, Deserialize, Validate)]
pub struct IssueCredentialRequest {
    /// Identity the credential will authenticate.
    #[validate(length(min = 1, max = 255))]
    #[validate(custom(function = "validate_user"))]
    pub user: String,
}

fn validate_user(user: &str) -> Result<(), ValidationError> {
    if user.chars().any(char::is_control) {
        return Err(ValidationError::new("control_characters"));
    }
    if user.trim() != user {
        return Err(ValidationError::new("surrounding_whitespace"));
    }
    Ok(())
}

/// A freshly issued credential.
///
/// The same cookie is also sent as a `Set-Cookie` header; callers that proxy
/// the browser response can forward that header as-is.
#[derive(Debug, Serialize)]
pub struct IssueCredentialResponse {
    pub user: String,
    pub selector: String,
    pub expires_at: DateTime<Utc>,
    pub cookie_name: String,
    pub cookie_value: String,
    pub max_age: u64,
}
