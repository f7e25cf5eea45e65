//! Remember-me cookie middleware for browser routes.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::state::AppState;
use crate::web::extractors::RememberedUser;

/// Resolves the remember-me cookie on every request.
///
/// # Flow
///
/// 1. Read and verify the signed cookie (absent cookie: request passes through)
/// 2. Authenticate the token, rotating its validator
/// 3. On success insert [`RememberedUser`] into request extensions and append
///    the rotated cookie to the response
///
/// # Failure Handling
///
/// - Malformed, unknown, expired or mismatched cookies: the request continues
///   anonymously and the cookie is cleared
/// - Store or entropy failures: the request continues anonymously, the
///   cookie is left intact so the next request can retry
///
/// A handler that sets its own remember-me cookie (logout) takes precedence
/// over the rotated one.
///
/// # Example
///
/// ```rust,ignore
/// let session = web::routes::session_routes()
///     .layer(middleware::from_fn_with_state(state.clone(), remember_me::layer));
/// ```
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut cookie_update = None;

    if let Some(decoded) = st.cookie_codec.read(req.headers()) {
        let outcome = match decoded {
            Ok(cookie) => st.remember_me.authenticate(cookie).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(login) => {
                cookie_update = Some(st.cookie_codec.set_cookie(&login.cookie));
                req.extensions_mut().insert(RememberedUser {
                    user: login.user,
                    selector: login.cookie.selector,
                    expires_at: login.expires_at,
                });
            }
            Err(e) => {
                metrics::counter!("remember_me_rejected_total", "reason" => e.kind()).increment(1);

                if e.is_not_remembered() {
                    debug!(reason = e.kind(), "Request not remembered, clearing cookie");
                    cookie_update = Some(st.cookie_codec.clear_cookie());
                } else {
                    warn!(error = %e, "Remember-me check failed, continuing anonymously");
                }
            }
        }
    }

    let mut response = next.run(req).await;

    if let Some(value) = cookie_update
        && !sets_cookie(response.headers(), st.cookie_codec.cookie_name())
    {
        response.headers_mut().append(SET_COOKIE, value);
    }

    response
}

fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .ok()
            .and_then(|v| v.split_once('='))
            .is_some_and(|(cookie_name, _)| cookie_name.trim() == name)
    })
}
