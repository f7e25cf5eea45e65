//! In-process credential store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::entities::StoredCredential;
use crate::domain::repositories::{CredentialStore, MAX_SELECTOR_ATTEMPTS};
use crate::error::RememberMeError;
use crate::utils::selector::generate_selector;

#[derive(Default)]
struct Inner {
    records: HashMap<String, StoredCredential>,
    by_user: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn index(&mut self, user: &str, selector: &str) {
        self.by_user
            .entry(user.to_string())
            .or_default()
            .insert(selector.to_string());
    }

    fn unindex(&mut self, user: &str, selector: &str) {
        if let Some(selectors) = self.by_user.get_mut(user) {
            selectors.remove(selector);
            if selectors.is_empty() {
                self.by_user.remove(user);
            }
        }
    }

    fn replace(&mut self, selector: &str, credential: StoredCredential) {
        let previous_user = self.records.get(selector).map(|p| p.user.clone());
        if let Some(previous_user) = previous_user
            && previous_user != credential.user
        {
            self.unindex(&previous_user, selector);
        }
        self.index(&credential.user, selector);
        self.records.insert(selector.to_string(), credential);
    }
}

/// Credential store backed by a locked `HashMap`.
///
/// Used for tests and single-process deployments. All operations take one
/// lock, which makes `update` and `rotate` atomic per selector. Contents are
/// lost on restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        debug!("Using in-memory credential store");
        Self::default()
    }

    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, selector: &str) -> Result<StoredCredential, RememberMeError> {
        self.inner
            .read()
            .await
            .records
            .get(selector)
            .cloned()
            .ok_or(RememberMeError::NotFound)
    }

    async fn insert(
        &self,
        user: &str,
        validator_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, RememberMeError> {
        let mut inner = self.inner.write().await;

        for _ in 0..MAX_SELECTOR_ATTEMPTS {
            let selector = generate_selector()?;
            if inner.records.contains_key(&selector) {
                warn!("Selector collision on insert, retrying");
                continue;
            }

            inner.index(user, &selector);
            inner.records.insert(
                selector.clone(),
                StoredCredential::new(user, validator_hash, expires_at),
            );
            return Ok(selector);
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
        let mut inner = self.inner.write().await;

        if !inner.records.contains_key(selector) {
            return Err(RememberMeError::NotFound);
        }

        inner.replace(
            selector,
            StoredCredential::new(user, validator_hash, expires_at),
        );
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
        let mut inner = self.inner.write().await;

        let current = inner
            .records
            .get(selector)
            .ok_or(RememberMeError::NotFound)?;
        if current.validator_hash != expected_hash {
            return Ok(false);
        }

        inner.replace(
            selector,
            StoredCredential::new(user, validator_hash, expires_at),
        );
        Ok(true)
    }

    async fn delete_selector(&self, selector: &str) -> Result<(), RememberMeError> {
        let mut inner = self.inner.write().await;

        if let Some(removed) = inner.records.remove(selector) {
            inner.unindex(&removed.user, selector);
        }
        Ok(())
    }

    async fn delete_user(&self, user: &str) -> Result<(), RememberMeError> {
        let mut inner = self.inner.write().await;

        if let Some(selectors) = inner.by_user.remove(user) {
            for selector in selectors {
                inner.records.remove(&selector);
            }
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RememberMeError> {
        let mut inner = self.inner.write().await;

        let expired: Vec<(String, String)> = inner
            .records
            .iter()
            .filter(|(_, c)| c.is_expired_at(now))
            .map(|(s, c)| (s.clone(), c.user.clone()))
            .collect();

        for (selector, user) in &expired {
            inner.records.remove(selector);
            inner.unindex(user, selector);
        }

        Ok(expired.len() as u64)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
