//! Transport of remember-me tokens inside a signed HTTP cookie.
//!
//! - [`cookie_codec`] - Versioned, HMAC-signed cookie encoding and
//!   `Set-Cookie` rendering

pub mod cookie_codec;

pub use cookie_codec::CookieCodec;
