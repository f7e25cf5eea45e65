//! The remember-me token: selector plus secret validator.
//!
//! A [`LoginCookie`] is the client-held half of a split credential. The
//! selector is a public lookup key; the validator is 32 random bytes that only
//! the client holds. The server stores nothing but the validator's SHA-256
//! digest and compares against it in constant time.

use std::time::Duration;

use base64::Engine as _;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::RememberMeError;
use crate::utils::selector::fill_random;

/// Number of random bytes drawn for every validator.
pub const VALIDATOR_LENGTH_BYTES: usize = 32;

/// One remember-me credential as carried by the client.
///
/// The validator is never logged: `Debug` prints it redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCookie {
    pub selector: String,
    validator: String,
    pub cookie_name: String,
    pub max_age: Duration,
}

impl LoginCookie {
    /// Creates a token with no selector and no validator yet.
    ///
    /// The selector is assigned by the store on insert.
    pub fn new(cookie_name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            selector: String::new(),
            validator: String::new(),
            cookie_name: cookie_name.into(),
            max_age,
        }
    }

    /// Rebuilds a token from fields read back from the transport cookie.
    pub fn from_parts(
        selector: impl Into<String>,
        validator: impl Into<String>,
        cookie_name: impl Into<String>,
        max_age: Duration,
    ) -> Self {
        Self {
            selector: selector.into(),
            validator: validator.into(),
            cookie_name: cookie_name.into(),
            max_age,
        }
    }

    /// The raw validator. Empty until [`Self::generate_validator`] runs.
    pub fn validator(&self) -> &str {
        &self.validator
    }

    pub fn has_validator(&self) -> bool {
        !self.validator.is_empty()
    }

    /// Replaces the validator with 32 fresh random bytes and returns its hash.
    ///
    /// The hash, together with the selector, is what the store persists.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::RandomnessUnavailable`] if the OS entropy
    /// source fails. The previous validator is left untouched in that case.
    pub fn generate_validator(&mut self) -> Result<String, RememberMeError> {
        let mut buffer = [0u8; VALIDATOR_LENGTH_BYTES];
        fill_random(&mut buffer)?;

        self.validator = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);

        Ok(self.hash())
    }

    /// Issues a new validator for the same selector.
    pub fn rotate(&mut self) -> Result<String, RememberMeError> {
        self.generate_validator()
    }

    /// SHA-256 of the validator, URL-safe base64 without padding.
    ///
    /// Deterministic across processes; no salt is involved.
    pub fn hash(&self) -> String {
        let digest = Sha256::digest(self.validator.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
    }

    /// Compares the hash of the held validator against `presented_hash`.
    ///
    /// Both sides are digested to 32 bytes first, so the constant-time
    /// comparison never short-circuits on length. Always false when no
    /// validator is set.
    pub fn check(&self, presented_hash: &str) -> bool {
        let expected = Sha256::digest(self.hash().as_bytes());
        let presented = Sha256::digest(presented_hash.as_bytes());

        let matches: bool = expected.as_slice().ct_eq(presented.as_slice()).into();
        matches && self.has_validator()
    }
}

impl std::fmt::Debug for LoginCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCookie")
            .field("selector", &self.selector)
            .field("validator", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .finish()
    }
}
