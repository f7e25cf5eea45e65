mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use remember_me::application::services::TheftResponse;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (state, _store) = common::create_test_state();
    let server = TestServer::new(common::api_app(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["credential_store"]["status"], "ok");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_health_endpoint_degraded_when_store_unreachable() {
    let state = common::create_state_with(Arc::new(common::UnreachableStore), TheftResponse::RevokeUser);
    let server = TestServer::new(common::api_app(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["credential_store"]["status"], "error");
}

#[tokio::test]
async fn test_health_does_not_require_token() {
    let (state, _store) = common::create_test_state();
    let server = TestServer::new(common::api_app(state)).unwrap();

    server.get("/health").await.assert_status_ok();
}
