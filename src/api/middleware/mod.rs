//! HTTP middleware shared by the API and web routers.
//!
//! Provides bearer authentication for the internal API, rate limiting, and
//! request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
