//! HTTP server
//!
//! [`AppState`] bundles the collaborators every handler needs; they are built
//! once by [`AppState::from_config`] (or injected directly in tests) and
//! handed to the router, so no handler reaches for global state.
//!
//! [`build_router`] wires the routes together with:
//!
//! - CORS for the single configured origin, with credentials
//! - cache-disabling headers on every response
//! - request tracing
//! - static files from the public directory

pub mod handlers;
pub mod pages;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::provider::{GoogleProvider, IdentityProvider};
use crate::auth::session::{MemorySessionStore, Sessions};
use crate::auth::token_store::{InMemoryTokenStore, TokenStore};
use crate::config::{Config, ServerConfig};
use crate::error::{RelayError, Result};
use crate::notifier::LocalAppNotifier;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub sessions: Sessions,
    pub notifier: Arc<LocalAppNotifier>,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        provider: Arc<dyn IdentityProvider>,
        sessions: Sessions,
        notifier: Arc<LocalAppNotifier>,
        public_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tokens,
            provider,
            sessions,
            notifier,
            public_dir: public_dir.into(),
        }
    }

    /// Builds the production collaborators: in-memory token and session
    /// stores, the Google provider, and the loopback notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the notifier URL
    /// is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(RelayError::Http)?;
        let provider = GoogleProvider::new(http, config.google.clone());
        let notifier = LocalAppNotifier::new(&config.notifier)?;
        let sessions = Sessions::new(Arc::new(MemorySessionStore::new()), &config.session);

        Ok(Self::new(
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(provider),
            sessions,
            Arc::new(notifier),
            &config.server.public_dir,
        ))
    }
}

/// Builds the CORS policy: one origin, credentials allowed.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| RelayError::Config(format!("invalid allowed origin: {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Assembles the application router.
///
/// # Errors
///
/// Returns [`RelayError::Config`] if the allowed origin is not a valid header
/// value.
pub fn build_router(state: AppState, server: &ServerConfig) -> Result<Router> {
    let public = ServeDir::new(&state.public_dir);

    let router = Router::new()
        .route("/", get(handlers::homepage))
        .route("/auth/google", get(handlers::auth_google))
        .route("/auth/google/callback", get(handlers::auth_google_callback))
        .route("/user", get(handlers::session_user))
        .route(
            "/api/user",
            get(handlers::api_user).options(handlers::api_user_options),
        )
        .route("/logout", get(handlers::logout))
        .fallback_service(public)
        .with_state(state)
        .layer(cors_layer(&server.allowed_origin)?)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("surrogate-control"),
            HeaderValue::from_static("no-store"),
        ));

    Ok(router)
}

/// Runs the relay until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the state cannot be built or the listener cannot bind.
pub async fn serve(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(RelayError::Io)?;
    tracing::info!("Server running on http://localhost:{}", config.server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RelayError::Io)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        assert!(cors_layer("http://bad\norigin").is_err());
    }

    #[test]
    fn test_from_config_builds_state() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(state.public_dir, PathBuf::from("public"));
        assert_eq!(state.sessions.cookie_name(), "relay.sid");
    }
}
