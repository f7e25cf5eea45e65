//! Domain layer: the remember-me token and the store contract.
//!
//! - [`login_cookie`] - Selector/validator token with constant-time checking
//! - [`entities`] - Stored credential record
//! - [`repositories`] - [`repositories::CredentialStore`] trait
//!
//! The domain layer has no dependency on HTTP or on any particular backend.

pub mod entities;
pub mod login_cookie;
pub mod repositories;

pub use login_cookie::LoginCookie;
