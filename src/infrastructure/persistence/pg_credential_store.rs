//! PostgreSQL implementation of the credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::StoredCredential;
use crate::domain::repositories::{CredentialStore, MAX_SELECTOR_ATTEMPTS};
use crate::error::RememberMeError;
use crate::utils::selector::generate_selector;

/// PostgreSQL store for remember-me credentials.
///
/// Rows live in `remember_me_credentials` with the selector as primary key.
/// Updates and rotations are single `UPDATE` statements, so each one is
/// atomic per selector without an explicit transaction.
pub struct PgCredentialStore {
    pool: Arc<PgPool>,
}

impl PgCredentialStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Counts live (unexpired) credentials.
    pub async fn count_live(&self) -> Result<i64, RememberMeError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remember_me_credentials WHERE expires_at > NOW()",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    /// Counts live credentials of one user.
    pub async fn count_live_for_user(&self, user: &str) -> Result<i64, RememberMeError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remember_me_credentials WHERE user_id = $1 AND expires_at > NOW()",
        )
        .bind(user)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    /// Counts expired credentials still waiting for a purge.
    pub async fn count_expired(&self) -> Result<i64, RememberMeError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remember_me_credentials WHERE expires_at <= NOW()",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get(&self, selector: &str) -> Result<StoredCredential, RememberMeError> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT user_id, validator_hash, expires_at
            FROM remember_me_credentials
            WHERE selector = $1
            "#,
        )
        .bind(selector)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(|(user, hash, expires_at)| StoredCredential::new(user, hash, expires_at))
            .ok_or(RememberMeError::NotFound)
    }

    async fn insert(
        &self,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, RememberMeError> {
        for _ in 0..MAX_SELECTOR_ATTEMPTS {
            let selector = generate_selector()?;

            let result = sqlx::query(
                r#"
                INSERT INTO remember_me_credentials (selector, user_id, validator_hash, expires_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (selector) DO NOTHING
                "#,
            )
            .bind(&selector)
            .bind(user)
            .bind(validator_hash)
            .bind(expires_at)
            .execute(self.pool.as_ref())
            .await?;

            if result.rows_affected() == 1 {
                return Ok(selector);
            }

            warn!("Selector collision on insert, retrying");
        }

        Err(RememberMeError::StoreUnavailable(
            "could not allocate a unique selector".to_string(),
        ))
    }

    async fn update(
        &self,
        selector: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RememberMeError> {
        let result = sqlx::query(
            r#"
            UPDATE remember_me_credentials
            SET user_id = $2, validator_hash = $3, expires_at = $4, updated_at = NOW()
            WHERE selector = $1
            "#,
        )
        .bind(selector)
        .bind(user)
        .bind(validator_hash)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RememberMeError::NotFound);
        }

        Ok(())
    }

    async fn rotate(
        &self,
        selector: &str,
        expected_hash: &str,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RememberMeError> {
        let result = sqlx::query(
            r#"
            UPDATE remember_me_credentials
            SET user_id = $3, validator_hash = $4, expires_at = $5, updated_at = NOW()
            WHERE selector = $1 AND validator_hash = $2
            "#,
        )
        .bind(selector)
        .bind(expected_hash)
        .bind(user)
        .bind(validator_hash)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Tell "rotated by someone else" apart from "gone".
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM remember_me_credentials WHERE selector = $1)",
        )
        .bind(selector)
        .fetch_one(self.pool.as_ref())
        .await?;

        if exists {
            Ok(false)
        } else {
            Err(RememberMeError::NotFound)
        }
    }

    async fn delete_selector(&self, selector: &str) -> Result<(), RememberMeError> {
        sqlx::query("DELETE FROM remember_me_credentials WHERE selector = $1")
            .bind(selector)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user: &str) -> Result<(), RememberMeError> {
        sqlx::query("DELETE FROM remember_me_credentials WHERE user_id = $1")
            .bind(user)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RememberMeError> {
        let result = sqlx::query("DELETE FROM remember_me_credentials WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
