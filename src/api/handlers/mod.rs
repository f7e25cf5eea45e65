//! HTTP request handlers for API endpoints.

pub mod credentials;
pub mod health;

pub use credentials::{
    issue_credential_handler, revoke_credential_handler, revoke_user_credentials_handler,
};
pub use health::health_handler;
