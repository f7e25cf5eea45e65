//! Handlers for browser session endpoints.

mod session;

pub use session::{WhoAmIResponse, logout_everywhere_handler, logout_handler, whoami_handler};
