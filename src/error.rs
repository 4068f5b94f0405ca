//! Error types for the OAuth relay
//!
//! [`RelayError`] covers failures inside the relay (configuration, the
//! identity provider exchange, session storage, the local notifier).
//! [`ApiError`] is the HTTP-facing rejection returned by handlers and
//! guards; it renders the `{ "error": ... }` bodies the desktop client
//! matches on and never leaks internal detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The identity provider rejected the exchange or the user declined consent
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Provider responded with something we could not use
    #[error("Provider error: {0}")]
    Provider(String),

    /// Browser session storage errors
    #[error("Session error: {0}")]
    Session(String),

    /// Local desktop application could not be notified
    #[error("Notifier error: {0}")]
    Notifier(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for relay operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`RelayError`].
pub type Result<T> = anyhow::Result<T>;

/// Rejection type for HTTP handlers and authentication guards.
///
/// The first four variants map to 401 responses with fixed messages. The
/// messages are part of the contract with the desktop client and must not
/// change.
#[derive(Debug)]
pub enum ApiError {
    /// `/user` requested without an authenticated browser session
    NotAuthenticated,
    /// `Authorization` header missing or not a `Bearer ` credential
    NoBearerToken,
    /// `Bearer ` prefix present but the token segment is empty
    InvalidTokenFormat,
    /// Well-formed token that was never issued by this process
    UnknownToken,
    /// Anything else; logged, reported to the client as a bare 500
    Internal(anyhow::Error),
}

impl ApiError {
    /// HTTP status code for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message placed in the `error` field.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "Not authenticated",
            ApiError::NoBearerToken => "No Bearer token provided",
            ApiError::InvalidTokenFormat => "Invalid token format",
            ApiError::UnknownToken => "Invalid or expired token",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref err) = self {
            tracing::error!("Request failed: {:#}", err);
        }
        let body = Json(json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}
