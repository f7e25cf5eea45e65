//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - Credential stores (in-memory, PostgreSQL, Redis)

pub mod persistence;
