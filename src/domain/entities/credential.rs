//! Stored remember-me credential record.

use chrono::{DateTime, Utc};

/// Server-side half of a remember-me credential, keyed by selector.
///
/// Holds the validator hash only; the raw validator never reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub user: String,
    pub validator_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCredential {
    pub fn new(
        user: impl Into<String>,
        validator_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user: user.into(),
            validator_hash: validator_hash.into(),
            expires_at,
        }
    }

    /// Returns true once `now` has reached the expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the credential has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let credential = StoredCredential::new("alice", "hash", now);

        assert!(credential.is_expired_at(now));
        assert!(credential.is_expired_at(now + Duration::seconds(1)));
        assert!(!credential.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_future_credential_is_live() {
        let credential = StoredCredential::new("bob", "hash", Utc::now() + Duration::days(30));
        assert!(!credential.is_expired());
    }
}
