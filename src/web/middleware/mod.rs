//! Browser-facing middleware.

pub mod remember_me;
