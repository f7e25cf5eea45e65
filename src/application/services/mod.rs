//! Business logic services for the application layer.

pub mod remember_me_service;

pub use remember_me_service::{
    IssuedCredential, RememberMeService, RememberMeSettings, RememberedLogin, TheftResponse,
};
