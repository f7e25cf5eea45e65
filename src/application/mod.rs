//! Application layer services implementing the remember-me lifecycle.
//!
//! Services consume the store trait and expose issue, verify-and-rotate and
//! revocation operations to the HTTP layer and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::remember_me_service::RememberMeService`] - Credential lifecycle
//!   with rotation on use and revocation on mismatch

pub mod services;
