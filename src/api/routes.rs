//! Internal API route configuration.
//!
//! All endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    issue_credential_handler, revoke_credential_handler, revoke_user_credentials_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, post},
};

/// Routes used by the upstream login service.
///
/// # Endpoints
///
/// - `POST   /credentials`               - Issue a credential after password login
/// - `DELETE /credentials/{selector}`    - Revoke one credential
/// - `DELETE /users/{user}/credentials`  - Revoke all credentials of a user
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/credentials", post(issue_credential_handler))
        .route("/credentials/{selector}", delete(revoke_credential_handler))
        .route(
            "/users/{user}/credentials",
            delete(revoke_user_credentials_handler),
        )
}
