//! Core domain entities.
//!
//! - [`StoredCredential`] - Server-side record of a remember-me credential

pub mod credential;

pub use credential::StoredCredential;
