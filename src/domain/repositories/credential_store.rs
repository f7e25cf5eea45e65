//! Store trait for selector-indexed remember-me credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::StoredCredential;
use crate::error::RememberMeError;

/// Number of fresh selectors a store tries before giving up on insert.
pub const MAX_SELECTOR_ATTEMPTS: usize = 5;

/// Durable mapping from selector to (user, validator hash, expiration).
///
/// Every backend must enforce selector uniqueness, support point lookup by
/// selector and bulk delete by user, and apply `update` and `rotate`
/// atomically per selector.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryCredentialStore`] - in-process map
/// - [`crate::infrastructure::persistence::PgCredentialStore`] - PostgreSQL
/// - [`crate::infrastructure::persistence::RedisCredentialStore`] - Redis
/// - Test mocks available with `cfg(test)`
///
/// # Errors
///
/// Backend failures surface as [`RememberMeError::StoreUnavailable`]. They
/// deny the remember-me login for the current request only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up the record for `selector`.
    ///
    /// Expired records may still be returned; the caller decides.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::NotFound`] if the selector is absent.
    async fn get(&self, selector: &str) -> Result<StoredCredential, RememberMeError>;

    /// Persists a new credential under a freshly generated selector.
    ///
    /// The selector is drawn from the OS CSPRNG and never chosen by the
    /// caller. Collisions with live selectors are retried up to
    /// [`MAX_SELECTOR_ATTEMPTS`] times.
    ///
    /// `expires_at` round-trips exactly through [`CredentialStore::get`] when
    /// it has whole-second precision. Finer parts may be truncated: PostgreSQL
    /// keeps microseconds and Redis milliseconds. The same holds for
    /// `update` and `rotate`.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::RandomnessUnavailable`] if no selector can
    /// be drawn and [`RememberMeError::StoreUnavailable`] on backend failure.
    async fn insert(
        &self,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, RememberMeError>;

    /// Replaces the record for an existing selector.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::NotFound`] if the selector no longer exists,
    /// for example after a concurrent revocation.
    async fn update(
        &self,
        selector: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RememberMeError>;

    /// Replaces the record only if it still carries `expected_hash`.
    ///
    /// Returns `Ok(false)` when the record exists with a different hash,
    /// meaning another request rotated it first.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::NotFound`] if the selector no longer exists.
    async fn rotate(
        &self,
        selector: &str,
        expected_hash: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RememberMeError>;

    /// Removes one record. Removing an absent selector succeeds.
    async fn delete_selector(&self, selector: &str) -> Result<(), RememberMeError>;

    /// Removes every record belonging to `user`.
    async fn delete_user(&self, user: &str) -> Result<(), RememberMeError>;

    /// Removes records that expired at or before `now`; returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RememberMeError>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
