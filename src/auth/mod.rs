//! Google sign-in, bearer tokens, and browser sessions
//!
//! # Module Layout
//!
//! - [`identity`]    -- user identity records and provider profiles
//! - [`provider`]    -- OAuth 2.0 authorization code exchange with Google
//! - [`token_store`] -- registry of issued bearer tokens
//! - [`session`]     -- cookie-backed browser sessions
//! - [`guards`]      -- `BrowserSessionAuth` / `BearerTokenAuth` extractors

pub mod guards;
pub mod identity;
pub mod provider;
pub mod session;
pub mod token_store;

use base64::Engine as _;

/// Random URL-safe string built from `len` random bytes, base64url encoded
/// without padding. Used for session ids and the OAuth `state` nonce.
pub(crate) fn random_urlsafe(len: usize) -> String {
    use rand::RngCore as _;
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
