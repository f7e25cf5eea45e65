//! Per-client rate limiting using the token bucket algorithm.

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Token bucket parameters.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Seconds between token replenishments.
    pub per_second: u64,
    pub burst_size: u32,
}

/// Limits for endpoints hit by browsers on every page load.
///
/// One token replenished every 2 seconds, bursts of up to 100 requests.
pub const PUBLIC: Limits = Limits {
    per_second: 2,
    burst_size: 100,
};

/// Stricter limits for the internal API and state-changing session routes.
///
/// One token per second, bursts of up to 10 requests.
pub const SECURE: Limits = Limits {
    per_second: 1,
    burst_size: 10,
};

fn governor<K>(
    key_extractor: K,
    limits: Limits,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>
where
    K: KeyExtractor,
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(limits.per_second)
            .burst_size(limits.burst_size)
            .finish()
            .expect("rate limit parameters are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Applies a rate limiter to `router`.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// - `behind_proxy == false` - peer socket address
/// - `behind_proxy == true` - `X-Forwarded-For` / `X-Real-IP` / `Forwarded`,
///   falling back to the peer address; enable only behind a trusted proxy
///
/// # Example
///
/// ```rust,ignore
/// let api = rate_limit::apply(api::routes::protected_routes(), rate_limit::SECURE, false);
/// ```
pub fn apply<S>(router: Router<S>, limits: Limits, behind_proxy: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if behind_proxy {
        router.layer(governor(SmartIpKeyExtractor, limits))
    } else {
        router.layer(governor(PeerIpKeyExtractor, limits))
    }
}
