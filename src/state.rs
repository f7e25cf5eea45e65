use std::sync::Arc;

use crate::application::services::RememberMeService;
use crate::transport::CookieCodec;

/// Shared handles injected into every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub remember_me: Arc<RememberMeService>,
    pub cookie_codec: Arc<CookieCodec>,
    pub internal_api_token: Arc<str>,
}

impl AppState {
    pub fn new(
        remember_me: Arc<RememberMeService>,
        cookie_codec: Arc<CookieCodec>,
        internal_api_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            remember_me,
            cookie_codec,
            internal_api_token: internal_api_token.into(),
        }
    }
}
