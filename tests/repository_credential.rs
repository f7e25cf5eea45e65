//! PostgreSQL credential store tests.
//!
//! Run with a database available:
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test repository_credential -- --ignored
//! ```

use chrono::{DateTime, Duration, SubsecRound, Utc};
use remember_me::application::services::{RememberMeService, RememberMeSettings};
use remember_me::domain::LoginCookie;
use remember_me::domain::repositories::CredentialStore;
use remember_me::error::RememberMeError;
use remember_me::infrastructure::persistence::PgCredentialStore;
use remember_me::utils::selector::is_valid_selector;
use sqlx::PgPool;
use std::sync::Arc;

fn in_hours(hours: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::hours(hours)).trunc_subsecs(0)
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_then_get(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let expires_at = in_hours(1);

    let selector = store.insert("alice", "hash-1", expires_at).await.unwrap();
    let record = store.get(&selector).await.unwrap();

    assert!(is_valid_selector(&selector));
    assert_eq!(record.user, "alice");
    assert_eq!(record.validator_hash, "hash-1");
    assert_eq!(record.expires_at, expires_at);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_issued_expiration_matches_stored_record(pool: PgPool) {
    let store = Arc::new(PgCredentialStore::new(Arc::new(pool)));
    let service = RememberMeService::new(store.clone(), RememberMeSettings::default());

    let issued = service.issue("alice").await.unwrap();
    let record = store.get(&issued.cookie.selector).await.unwrap();
    assert_eq!(record.expires_at, issued.expires_at);

    let login = service.authenticate(issued.cookie).await.unwrap();
    let record = store.get(&login.cookie.selector).await.unwrap();
    assert_eq!(record.expires_at, login.expires_at);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_get_missing(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));

    let result = store.get("missing").await;

    assert!(matches!(result, Err(RememberMeError::NotFound)));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_switches_validator(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let mut cookie = LoginCookie::new("remember_me", std::time::Duration::from_secs(3600));
    let old_hash = cookie.generate_validator().unwrap();
    let selector = store.insert("alice", &old_hash, in_hours(1)).await.unwrap();
    let old_cookie = cookie.clone();

    let new_hash = cookie.rotate().unwrap();
    store
        .update(&selector, "alice", &new_hash, in_hours(2))
        .await
        .unwrap();

    let record = store.get(&selector).await.unwrap();
    assert!(!old_cookie.check(&record.validator_hash));
    assert!(cookie.check(&record.validator_hash));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_missing(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));

    let result = store.update("missing", "alice", "h", in_hours(1)).await;

    assert!(matches!(result, Err(RememberMeError::NotFound)));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rotate_compare_and_swap(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let selector = store.insert("alice", "h1", in_hours(1)).await.unwrap();

    assert!(!store
        .rotate(&selector, "stale", "alice", "h2", in_hours(1))
        .await
        .unwrap());
    assert!(store
        .rotate(&selector, "h1", "alice", "h2", in_hours(1))
        .await
        .unwrap());
    assert!(!store
        .rotate(&selector, "h1", "alice", "h3", in_hours(1))
        .await
        .unwrap());

    assert_eq!(store.get(&selector).await.unwrap().validator_hash, "h2");
    assert!(matches!(
        store.rotate("missing", "h1", "alice", "h2", in_hours(1)).await,
        Err(RememberMeError::NotFound)
    ));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_rotation_single_winner(pool: PgPool) {
    let store = Arc::new(PgCredentialStore::new(Arc::new(pool)));
    let selector = store.insert("alice", "original", in_hours(1)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let selector = selector.clone();
        handles.push(tokio::spawn(async move {
            store
                .rotate(&selector, "original", "alice", &format!("h{i}"), in_hours(1))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_selector_idempotent(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let selector = store.insert("alice", "h", in_hours(1)).await.unwrap();

    store.delete_selector(&selector).await.unwrap();
    store.delete_selector(&selector).await.unwrap();

    assert!(matches!(
        store.get(&selector).await,
        Err(RememberMeError::NotFound)
    ));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_user(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let a = store.insert("alice", "h1", in_hours(1)).await.unwrap();
    let b = store.insert("alice", "h2", in_hours(1)).await.unwrap();
    let c = store.insert("carol", "h3", in_hours(1)).await.unwrap();

    store.delete_user("alice").await.unwrap();

    assert!(matches!(store.get(&a).await, Err(RememberMeError::NotFound)));
    assert!(matches!(store.get(&b).await, Err(RememberMeError::NotFound)));
    assert!(store.get(&c).await.is_ok());
    assert_eq!(store.count_live_for_user("alice").await.unwrap(), 0);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_purge_expired(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    let expired = store.insert("alice", "h1", in_hours(-1)).await.unwrap();
    let live = store.insert("alice", "h2", in_hours(1)).await.unwrap();

    assert_eq!(store.count_expired().await.unwrap(), 1);
    assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 1);

    assert!(matches!(
        store.get(&expired).await,
        Err(RememberMeError::NotFound)
    ));
    assert!(store.get(&live).await.is_ok());
    assert_eq!(store.count_live().await.unwrap(), 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    let store = PgCredentialStore::new(Arc::new(pool));
    assert!(store.health_check().await);
}
