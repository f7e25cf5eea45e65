//! Store trait definitions for the domain layer.
//!
//! The [`CredentialStore`] trait abstracts persistence of remember-me
//! credentials. Implementations live in `crate::infrastructure::persistence`;
//! a mock is generated via `mockall` for unit tests.

pub mod credential_store;

pub use credential_store::{CredentialStore, MAX_SELECTOR_ATTEMPTS};

#[cfg(test)]
pub use credential_store::MockCredentialStore;
