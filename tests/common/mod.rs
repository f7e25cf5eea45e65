#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, middleware, routing::get};
use chrono::{DateTime, Utc};
use remember_me::api;
use remember_me::api::handlers::health_handler;
use remember_me::api::middleware::auth;
use remember_me::application::services::{RememberMeService, RememberMeSettings, TheftResponse};
use remember_me::domain::entities::StoredCredential;
use remember_me::domain::repositories::CredentialStore;
use remember_me::error::RememberMeError;
use remember_me::infrastructure::persistence::MemoryCredentialStore;
use remember_me::state::AppState;
use remember_me::transport::CookieCodec;
use remember_me::web;
use remember_me::web::middleware::remember_me as remember_me_layer;
use std::sync::Arc;
use std::time::Duration;

pub const COOKIE_NAME: &str = "remember_me";
pub const SIGNING_SECRET: &str = "test-signing-secret-0123456789abcdef";
pub const API_TOKEN: &str = "test-internal-token";

pub fn settings(theft_response: TheftResponse) -> RememberMeSettings {
    RememberMeSettings {
        cookie_name: COOKIE_NAME.to_string(),
        ttl: Duration::from_secs(3600),
        theft_response,
    }
}

pub fn create_state_with(store: Arc<dyn CredentialStore>, theft_response: TheftResponse) -> AppState {
    let service = Arc::new(RememberMeService::new(store, settings(theft_response)));
    let codec = Arc::new(CookieCodec::new(SIGNING_SECRET, COOKIE_NAME, true).unwrap());

    AppState::new(service, codec, API_TOKEN)
}

pub fn create_test_state() -> (AppState, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = create_state_with(store.clone(), TheftResponse::RevokeUser);
    (state, store)
}

/// Session routes behind the remember-me middleware, without rate limiting.
pub fn session_app(state: AppState) -> Router {
    web::routes::session_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            remember_me_layer::layer,
        ))
        .with_state(state)
}

/// Internal API behind bearer auth, without rate limiting.
pub fn api_app(state: AppState) -> Router {
    let api = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state)
}

/// `name=value` part of a `Set-Cookie` header, usable as a `Cookie` header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

/// Store whose backend is always unreachable.
pub struct UnreachableStore;

fn down() -> RememberMeError {
    RememberMeError::StoreUnavailable("connection refused".to_string())
}

#[async_trait]
impl CredentialStore for UnreachableStore {
    async fn get(&self, _selector: &str) -> Result<StoredCredential, RememberMeError> {
        Err(down())
    }

    async fn insert(
        &self,
        _user: &str,
        _validator_hash: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<String, RememberMeError> {
        Err(down())
    }

    async fn update(
        &self,
        _selector: &str,
        _user: &str,
        _validator_hash: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), RememberMeError> {
        Err(down())
    }

    async fn rotate(
        &self,
        _selector: &str,
        _expected_hash: &str,
        _user: &str,
        _validator_hash: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<bool, RememberMeError> {
        Err(down())
    }

    async fn delete_selector(&self, _selector: &str) -> Result<(), RememberMeError> {
        Err(down())
    }

    async fn delete_user(&self, _user: &str) -> Result<(), RememberMeError> {
        Err(down())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, RememberMeError> {
        Err(down())
    }

    async fn health_check(&self) -> bool {
        false
    }
}
