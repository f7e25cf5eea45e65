//! Random selector generation and shape checks for client-supplied tokens.
//!
//! Selectors and validators are drawn from the OS entropy source via
//! `getrandom` and encoded as URL-safe base64 without padding.

use crate::error::RememberMeError;
use base64::Engine as _;

/// Length of random bytes behind a selector.
pub const SELECTOR_LENGTH_BYTES: usize = 18;

/// Encoded selector length (18 bytes, unpadded base64).
pub const SELECTOR_LENGTH: usize = 24;

/// Encoded validator length (32 bytes, unpadded base64).
pub const VALIDATOR_LENGTH: usize = 43;

/// Fills `buffer` from the operating system CSPRNG.
///
/// # Errors
///
/// Returns [`RememberMeError::RandomnessUnavailable`] if the entropy source
/// fails. Callers must not retry silently.
pub fn fill_random(buffer: &mut [u8]) -> Result<(), RememberMeError> {
    getrandom::fill(buffer).map_err(|e| RememberMeError::RandomnessUnavailable(e.to_string()))
}

/// Generates a fresh, unpredictable selector.
///
/// Produces a 24-character URL-safe string. Uniqueness against live records
/// is enforced by the store on insert.
pub fn generate_selector() -> Result<String, RememberMeError> {
    let mut buffer = [0u8; SELECTOR_LENGTH_BYTES];
    fill_random(&mut buffer)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `selector` has the shape produced by [`generate_selector`].
pub fn is_valid_selector(selector: &str) -> bool {
    selector.len() == SELECTOR_LENGTH && is_url_safe(selector)
}

/// Returns true if `validator` has the shape of an encoded 32-byte validator.
pub fn is_valid_validator(validator: &str) -> bool {
    validator.len() == VALIDATOR_LENGTH && is_url_safe(validator)
}

fn is_url_safe(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
