//! Utility functions shared by the domain and infrastructure layers.
//!
//! - [`selector`] - Random selector generation and token shape validation

pub mod selector;
