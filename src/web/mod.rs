//! Browser-facing layer: the remember-me middleware and session endpoints.
//!
//! # Modules
//!
//! - [`extractors`] - [`extractors::RememberedUser`] request extractor
//! - [`handlers`] - Session endpoint handlers
//! - [`middleware`] - Cookie resolution and rotation
//! - [`routes`] - Session route configuration

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use extractors::RememberedUser;
