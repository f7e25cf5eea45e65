//! Remember-me credential lifecycle: issue, verify-and-rotate, revoke.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use crate::domain::LoginCookie;
use crate::domain::repositories::CredentialStore;
use crate::error::RememberMeError;

/// What to revoke when a presented validator does not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TheftResponse {
    /// Delete every credential of the affected user.
    #[default]
    RevokeUser,
    /// Delete only the credential behind the presented selector.
    RevokeSelector,
}

impl TheftResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RevokeUser => "revoke_user",
            Self::RevokeSelector => "revoke_selector",
        }
    }
}

impl FromStr for TheftResponse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revoke_user" => Ok(Self::RevokeUser),
            "revoke_selector" => Ok(Self::RevokeSelector),
            other => Err(format!(
                "expected 'revoke_user' or 'revoke_selector', got '{other}'"
            )),
        }
    }
}

/// Settings for issuing and rotating credentials.
#[derive(Debug, Clone)]
pub struct RememberMeSettings {
    pub cookie_name: String,
    /// Lifetime of a credential, renewed on every successful rotation.
    pub ttl: Duration,
    pub theft_response: TheftResponse,
}

impl Default for RememberMeSettings {
    fn default() -> Self {
        Self {
            cookie_name: "remember_me".to_string(),
            ttl: Duration::from_secs(30 * 24 * 3600),
            theft_response: TheftResponse::default(),
        }
    }
}

/// A freshly issued credential, ready to be written into the transport cookie.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub user: String,
    pub cookie: LoginCookie,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful remember-me login.
///
/// `cookie` already carries the rotated validator and must replace the
/// client's cookie.
#[derive(Debug, Clone)]
pub struct RememberedLogin {
    pub user: String,
    pub cookie: LoginCookie,
    pub expires_at: DateTime<Utc>,
}

/// Service orchestrating remember-me credentials against a [`CredentialStore`].
///
/// The store is injected at construction; the service keeps no other state.
pub struct RememberMeService {
    store: Arc<dyn CredentialStore>,
    settings: RememberMeSettings,
}

impl RememberMeService {
    /// Creates a new remember-me service.
    pub fn new(store: Arc<dyn CredentialStore>, settings: RememberMeSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RememberMeSettings {
        &self.settings
    }

    /// Issues a new credential for `user`.
    ///
    /// Call only after the user has been authenticated by other means.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::RandomnessUnavailable`] if no validator or
    /// selector can be drawn, and [`RememberMeError::StoreUnavailable`] if the
    /// record cannot be persisted. No cookie must be set in either case.
    pub async fn issue(&self, user: &str) -> Result<IssuedCredential, RememberMeError> {
        let mut cookie = LoginCookie::new(&self.settings.cookie_name, self.settings.ttl);
        let hash = cookie.generate_validator()?;
        let expires_at = self.expiration_from(Utc::now());

        cookie.selector = self.store.insert(user, &hash, expires_at).await?;

        metrics::counter!("remember_me_issued_total").increment(1);
        info!(user, "Issued remember-me credential");

        Ok(IssuedCredential {
            user: user.to_string(),
            cookie,
            expires_at,
        })
    }

    /// Verifies a cookie presented by a client and rotates its validator.
    ///
    /// # Flow
    ///
    /// 1. Look up the record by selector
    /// 2. Expired records are deleted and reported as not found
    /// 3. A validator mismatch is a theft signal: credentials are revoked
    ///    according to [`TheftResponse`]
    /// 4. The validator is rotated with a compare-and-swap; losing the race
    ///    means a stale validator was replayed and is handled like a mismatch
    ///
    /// # Errors
    ///
    /// - [`RememberMeError::NotFound`] if the selector is unknown or expired
    /// - [`RememberMeError::Malformed`] if the cookie carries no validator
    /// - [`RememberMeError::ValidatorMismatch`] on a theft signal
    /// - [`RememberMeError::StoreUnavailable`] on backend failure
    /// - [`RememberMeError::RandomnessUnavailable`] if rotation cannot draw
    ///   a new validator
    pub async fn authenticate(
        &self,
        mut cookie: LoginCookie,
    ) -> Result<RememberedLogin, RememberMeError> {
        if cookie.selector.is_empty() || !cookie.has_validator() {
            return Err(RememberMeError::Malformed(
                "cookie carries no selector or validator".to_string(),
            ));
        }

        let record = self.store.get(&cookie.selector).await?;
        let now = Utc::now();

        if record.is_expired_at(now) {
            debug!(selector = %cookie.selector, "Remember-me credential expired");
            if let Err(e) = self.store.delete_selector(&cookie.selector).await {
                warn!(error = %e, "Failed to delete expired credential");
            }
            return Err(RememberMeError::NotFound);
        }

        if !cookie.check(&record.validator_hash) {
            self.respond_to_theft(&cookie.selector, &record.user).await;
            return Err(RememberMeError::ValidatorMismatch);
        }

        let previous_hash = record.validator_hash;
        let new_hash = cookie.rotate()?;
        let expires_at = self.expiration_from(now);

        let rotated = self
            .store
            .rotate(
                &cookie.selector,
                &previous_hash,
                &record.user,
                &new_hash,
                expires_at,
            )
            .await?;

        if !rotated {
            // Someone else already rotated this validator: it was replayed.
            self.respond_to_theft(&cookie.selector, &record.user).await;
            return Err(RememberMeError::ValidatorMismatch);
        }

        cookie.cookie_name = self.settings.cookie_name.clone();
        cookie.max_age = self.settings.ttl;

        metrics::counter!("remember_me_rotated_total").increment(1);
        debug!(user = %record.user, "Rotated remember-me validator");

        Ok(RememberedLogin {
            user: record.user,
            cookie,
            expires_at,
        })
    }

    /// Deletes the credential behind `cookie` (logout).
    pub async fn forget(&self, cookie: &LoginCookie) -> Result<(), RememberMeError> {
        if cookie.selector.is_empty() {
            return Ok(());
        }

        self.store.delete_selector(&cookie.selector).await?;
        info!("Forgot remember-me credential");
        Ok(())
    }

    /// Deletes one credential by selector.
    pub async fn revoke_selector(&self, selector: &str) -> Result<(), RememberMeError> {
        self.store.delete_selector(selector).await?;
        info!("Revoked remember-me credential");
        Ok(())
    }

    /// Deletes every credential of `user` ("log out everywhere").
    pub async fn revoke_user(&self, user: &str) -> Result<(), RememberMeError> {
        self.store.delete_user(user).await?;
        info!(user, "Revoked all remember-me credentials");
        Ok(())
    }

    /// Removes expired records from the store.
    pub async fn purge_expired(&self) -> Result<u64, RememberMeError> {
        let purged = self.store.purge_expired(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "Purged expired remember-me credentials");
        }
        Ok(purged)
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    async fn respond_to_theft(&self, selector: &str, user: &str) {
        metrics::counter!(
            "remember_me_theft_signals_total",
            "response" => self.settings.theft_response.as_str()
        )
        .increment(1);
        warn!(
            user,
            response = self.settings.theft_response.as_str(),
            "Remember-me validator mismatch, possible token theft"
        );

        let result = match self.settings.theft_response {
            TheftResponse::RevokeUser => self.store.delete_user(user).await,
            TheftResponse::RevokeSelector => self.store.delete_selector(selector).await,
        };

        if let Err(e) = result {
            warn!(error = %e, "Failed to revoke credentials after theft signal");
        }
    }

    /// Expirations are whole seconds so every backend stores them exactly.
    fn expiration_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.settings.ttl).unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .trunc_subsecs(0)
    }
}
