//! Per-route authentication guards
//!
//! The relay recognises two independent kinds of authentication:
//!
//! - [`BrowserSessionAuth`] -- the identity stored in the browser session by
//!   the OAuth callback. Ends on `/logout`.
//! - [`BearerTokenAuth`] -- an `Authorization: Bearer <token>` header naming a
//!   token from the [`TokenStore`](crate::auth::token_store::TokenStore).
//!   Survives `/logout`.
//!
//! Each is an axum extractor; a handler opts in by taking one as an argument.
//! Neither falls back to the other.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;

use crate::auth::identity::UserIdentity;
use crate::error::ApiError;
use crate::server::AppState;

/// Identity taken from the authenticated browser session.
#[derive(Debug, Clone)]
pub struct BrowserSessionAuth(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for BrowserSessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let session = state.sessions.current(&parts.headers).await?;
        match session.and_then(|s| s.data.user) {
            Some(user) => Ok(Self(user)),
            None => {
                tracing::info!("User endpoint called: Not authenticated");
                Err(ApiError::NotAuthenticated)
            }
        }
    }
}

/// Identity resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct BearerTokenAuth(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for BearerTokenAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).map(HeaderValue::as_bytes);

        let token = match parse_bearer(header) {
            Ok(token) => token,
            Err(err) => {
                tracing::info!("Bearer lookup rejected: {}", err.message());
                return Err(err);
            }
        };

        match state.tokens.get(token).await {
            Some(user) => {
                tracing::info!(user_id = %user.id, "Bearer token resolved");
                Ok(Self(user))
            }
            None => {
                tracing::info!(token = %redact(token), "No user found for token");
                Err(ApiError::UnknownToken)
            }
        }
    }
}

/// Pulls the token out of an `Authorization` header value.
///
/// The token is the first space-separated segment after `Bearer `. A bare
/// `Bearer` (the trailing space is often trimmed in transit) or a `Bearer `
/// prefix followed by nothing counts as a malformed token rather than a
/// missing one. Header values need not be UTF-8; a token that is not can
/// never have been issued and is reported as unknown.
pub fn parse_bearer(header: Option<&[u8]>) -> std::result::Result<&str, ApiError> {
    let value = header.ok_or(ApiError::NoBearerToken)?;
    if value == b"Bearer" {
        return Err(ApiError::InvalidTokenFormat);
    }
    let rest = value
        .strip_prefix(b"Bearer ")
        .ok_or(ApiError::NoBearerToken)?;
    let token = rest.split(|byte| *byte == b' ').next().unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::InvalidTokenFormat);
    }
    std::str::from_utf8(token).map_err(|_| ApiError::UnknownToken)
}

/// Shortens a token for log output.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}
