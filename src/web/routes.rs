//! Browser session route configuration.

use crate::state::AppState;
use crate::web::handlers::{logout_everywhere_handler, logout_handler, whoami_handler};
use axum::{
    Router,
    routing::{get, post},
};

/// Read-only session routes, hit by browsers on page loads.
///
/// - `GET  /whoami`             - Remembered user and credential expiry
pub fn read_routes() -> Router<AppState> {
    Router::new().route("/whoami", get(whoami_handler))
}

/// State-changing session routes.
///
/// - `POST /logout`             - Forget this browser's credential
/// - `POST /logout-everywhere`  - Revoke every credential of the user
pub fn logout_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout_handler))
        .route("/logout-everywhere", post(logout_everywhere_handler))
}

/// All session routes, served behind [`crate::web::middleware::remember_me`].
pub fn session_routes() -> Router<AppState> {
    read_routes().merge(logout_routes())
}
