//! Credential store implementations.
//!
//! Concrete implementations of [`crate::domain::repositories::CredentialStore`].
//!
//! # Stores
//!
//! - [`MemoryCredentialStore`] - In-process map for tests and single-node setups
//! - [`PgCredentialStore`] - PostgreSQL table via SQLx
//! - [`RedisCredentialStore`] - Redis hashes and sets, atomic via Lua scripts

pub mod memory_credential_store;
pub mod pg_credential_store;
pub mod redis_credential_store;

pub use memory_credential_store::MemoryCredentialStore;
pub use pg_credential_store::PgCredentialStore;
pub use redis_credential_store::RedisCredentialStore;
