//! Signed cookie encoding for [`LoginCookie`].
//!
//! # Format
//!
//! ```text
//! <name>=<base64url(payload)>.<base64url(HMAC-SHA256(key, "<name>=" + base64url(payload)))>
//! ```
//!
//! The payload is a small versioned JSON document:
//!
//! ```json
//! {"v":1,"sel":"<selector>","val":"<validator>","max_age":2592000}
//! ```
//!
//! Binding the cookie name into the MAC stops a value from being replayed
//! under another cookie name. Decoding fails closed: anything unexpected is
//! [`RememberMeError::Malformed`].

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::LoginCookie;
use crate::error::RememberMeError;
use crate::utils::selector::{is_valid_selector, is_valid_validator};

type HmacSha256 = Hmac<Sha256>;

/// Current payload version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Browsers reject cookies above roughly 4 KiB.
const MAX_COOKIE_VALUE_LENGTH: usize = 4096;

#[derive(Serialize, Deserialize)]
struct CookiePayload {
    v: u8,
    sel: String,
    val: String,
    max_age: u64,
}

/// Encodes, signs and verifies remember-me cookies.
///
/// Built once at startup from the configured secret and shared through
/// [`crate::state::AppState`].
pub struct CookieCodec {
    keyed_mac: HmacSha256,
    cookie_name: String,
    secure: bool,
}

impl CookieCodec {
    /// Creates a codec.
    ///
    /// # Arguments
    ///
    /// - `secret` - HMAC key, at least [`MIN_SECRET_LENGTH`] bytes
    /// - `cookie_name` - name of the remember-me cookie
    /// - `secure` - adds the `Secure` attribute to issued cookies
    ///
    /// # Errors
    ///
    /// Returns an error string if the secret is too short or the cookie name
    /// is not a valid cookie token.
    pub fn new(
        secret: impl AsRef<[u8]>,
        cookie_name: impl Into<String>,
        secure: bool,
    ) -> Result<Self, String> {
        let key = secret.as_ref();
        if key.len() < MIN_SECRET_LENGTH {
            return Err(format!(
                "cookie signing secret must be at least {MIN_SECRET_LENGTH} bytes"
            ));
        }

        let cookie_name = cookie_name.into();
        if !is_valid_cookie_name(&cookie_name) {
            return Err(format!("invalid cookie name '{cookie_name}'"));
        }

        let mut keyed_mac = HmacSha256::new_from_slice(key)
            .map_err(|e| format!("invalid cookie signing secret: {e}"))?;
        keyed_mac.update(cookie_name.as_bytes());
        keyed_mac.update(b"=");

        Ok(Self {
            keyed_mac,
            cookie_name,
            secure,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed_mac.clone()
    }

    /// Encodes `cookie` into a signed cookie value (without the name).
    pub fn encode(&self, cookie: &LoginCookie) -> String {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let payload = CookiePayload {
            v: PAYLOAD_VERSION,
            sel: cookie.selector.clone(),
            val: cookie.validator().to_string(),
            max_age: cookie.max_age.as_secs(),
        };
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        let body = engine.encode(json);

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        let tag = engine.encode(mac.finalize().into_bytes());

        format!("{body}.{tag}")
    }

    /// Verifies and decodes a signed cookie value.
    ///
    /// # Errors
    ///
    /// Returns [`RememberMeError::Malformed`] on any structural problem, a bad
    /// signature, an unknown version, or token fields of the wrong shape.
    pub fn decode(&self, value: &str) -> Result<LoginCookie, RememberMeError> {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let malformed = |reason: &str| RememberMeError::Malformed(reason.to_string());

        if value.len() > MAX_COOKIE_VALUE_LENGTH {
            return Err(malformed("cookie value too long"));
        }

        let (body, tag) = value
            .split_once('.')
            .ok_or_else(|| malformed("missing signature"))?;
        let tag = engine
            .decode(tag)
            .map_err(|_| malformed("signature is not base64"))?;

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| malformed("signature mismatch"))?;

        let json = engine
            .decode(body)
            .map_err(|_| malformed("payload is not base64"))?;
        let payload: CookiePayload =
            serde_json::from_slice(&json).map_err(|_| malformed("payload is not valid JSON"))?;

        if payload.v != PAYLOAD_VERSION {
            return Err(malformed("unsupported payload version"));
        }
        if !is_valid_selector(&payload.sel) || !is_valid_validator(&payload.val) {
            return Err(malformed("token fields have the wrong shape"));
        }

        Ok(LoginCookie::from_parts(
            payload.sel,
            payload.val,
            self.cookie_name.clone(),
            Duration::from_secs(payload.max_age),
        ))
    }

    /// Finds this codec's cookie in the request headers and decodes it.
    ///
    /// Returns `None` when the cookie is absent.
    pub fn read(&self, headers: &HeaderMap) -> Option<Result<LoginCookie, RememberMeError>> {
        read_cookie(headers, &self.cookie_name).map(|value| self.decode(&value))
    }

    /// Renders the `Set-Cookie` header value for `cookie`.
    pub fn set_cookie(&self, cookie: &LoginCookie) -> HeaderValue {
        self.header(&self.encode(cookie), cookie.max_age.as_secs())
    }

    /// Renders a `Set-Cookie` header value that deletes the cookie.
    pub fn clear_cookie(&self) -> HeaderValue {
        self.header("", 0)
    }

    fn header(&self, value: &str, max_age: u64) -> HeaderValue {
        let secure = if self.secure { "; Secure" } else { "" };
        let rendered = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
            self.cookie_name, value, max_age, secure
        );

        // Name is validated at construction and the value is base64url.
        HeaderValue::from_str(&rendered).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// Extracts the value of cookie `name` from all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key == name => Some(value.to_string()),
                _ => None,
            }
        })
}

fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
}
