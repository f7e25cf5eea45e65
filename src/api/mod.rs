//! Internal REST API and shared HTTP middleware.
//!
//! The internal API is called by the upstream login service to issue and
//! revoke credentials; it is never exposed to browsers.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for request/response serialization
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and tracing middleware
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
