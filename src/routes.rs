//! Top-level router configuration combining API and session routes.
//!
//! # Route Structure
//!
//! - `GET  /health`             - Health check: credential store (public)
//! - `GET  /whoami`             - Remembered user (remember-me cookie)
//! - `POST /logout`             - Forget this browser (remember-me cookie)
//! - `POST /logout-everywhere`  - Revoke all credentials (remember-me cookie)
//! - `/api/*`                   - Internal API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket; `SECURE` for `/api` and the
//!   logout routes, `PUBLIC` for `/whoami` (configurable for proxy deployments)
//! - **Authentication** - Bearer token (API) or remember-me cookie (session)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use crate::web;
use crate::web::middleware::remember_me;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let api_router = rate_limit::apply(
        api::routes::protected_routes()
            .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer)),
        rate_limit::SECURE,
        behind_proxy,
    );

    let remembered = |routes: Router<AppState>| {
        routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            remember_me::layer,
        ))
    };

    let session_router = rate_limit::apply(
        remembered(web::routes::read_routes()),
        rate_limit::PUBLIC,
        behind_proxy,
    )
    .merge(rate_limit::apply(
        remembered(web::routes::logout_routes()),
        rate_limit::SECURE,
        behind_proxy,
    ));

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .merge(session_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
