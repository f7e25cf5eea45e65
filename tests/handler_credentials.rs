mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use remember_me::application::services::TheftResponse;
use remember_me::domain::repositories::CredentialStore;
use serde_json::json;
use std::sync::Arc;

fn server() -> (TestServer, Arc<remember_me::infrastructure::persistence::MemoryCredentialStore>) {
    let (state, store) = common::create_test_state();
    (TestServer::new(common::api_app(state)).unwrap(), store)
}

#[tokio::test]
async fn test_issue_requires_bearer_token() {
    let (server, store) = server();

    let response = server
        .post("/api/credentials")
        .json(&json!({ "user": "alice" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_issue_rejects_wrong_token() {
    let (server, store) = server();

    let response = server
        .post("/api/credentials")
        .authorization_bearer("not-the-token")
        .json(&json!({ "user": "alice" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "unauthorized");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_issue_credential() {
    let (server, store) = server();

    let response = server
        .post("/api/credentials")
        .authorization_bearer(common::API_TOKEN)
        .json(&json!({ "user": "alice" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.starts_with("remember_me="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=3600"));

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["user"], "alice");
    assert_eq!(body["cookie_name"], "remember_me");
    assert_eq!(body["max_age"], 3600);
    assert_eq!(
        common::cookie_pair(set_cookie),
        format!("remember_me={}", body["cookie_value"].as_str().unwrap())
    );

    let selector = body["selector"].as_str().unwrap();
    let record = store.get(selector).await.unwrap();
    assert_eq!(record.user, "alice");
}

#[tokio::test]
async fn test_issue_validates_user() {
    let (server, store) = server();

    for user in ["", "bad\nuser", " padded"] {
        let response = server
            .post("/api/credentials")
            .authorization_bearer(common::API_TOKEN)
            .json(&json!({ "user": user }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error"]["code"], "validation_error");
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_issue_store_unavailable() {
    let state = common::create_state_with(
        Arc::new(common::UnreachableStore),
        TheftResponse::RevokeUser,
    );
    let server = TestServer::new(common::api_app(state)).unwrap();

    let response = server
        .post("/api/credentials")
        .authorization_bearer(common::API_TOKEN)
        .json(&json!({ "user": "alice" }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.maybe_header("set-cookie").is_none());
}

#[tokio::test]
async fn test_revoke_credential() {
    let (server, store) = server();
    let selector = store
        .insert("alice", "hash", chrono::Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();

    server
        .delete(&format!("/api/credentials/{selector}"))
        .authorization_bearer(common::API_TOKEN)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(store.is_empty().await);

    // Idempotent
    server
        .delete(&format!("/api/credentials/{selector}"))
        .authorization_bearer(common::API_TOKEN)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_revoke_credential_rejects_bad_selector() {
    let (server, _store) = server();

    server
        .delete("/api/credentials/not-a-selector")
        .authorization_bearer(common::API_TOKEN)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_user_credentials() {
    let (server, store) = server();
    let expires_at = chrono::Utc::now() + chrono::Duration::hours(1);
    store.insert("alice", "h1", expires_at).await.unwrap();
    store.insert("alice", "h2", expires_at).await.unwrap();
    let carol = store.insert("carol", "h3", expires_at).await.unwrap();

    server
        .delete("/api/users/alice/credentials")
        .authorization_bearer(common::API_TOKEN)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(store.len().await, 1);
    assert!(store.get(&carol).await.is_ok());
}
