//! Cookie-backed browser sessions
//!
//! Two cookies are involved in a browser sign-in:
//!
//! - the CSRF `state` cookie, set by `/auth/google` and read back by the
//!   callback. It holds the nonce itself, is scoped to `/auth/google` and
//!   expires after `session.state_max_age_seconds`. Nothing is stored server
//!   side for a sign-in in progress.
//! - the session cookie, an opaque random id referencing the authenticated
//!   [`UserIdentity`] served by `/user`. A session is only stored once a
//!   sign-in has completed.
//!
//! Session state is independent of the bearer token registry: ending a
//! session does not revoke the token issued during it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use tokio::sync::RwLock;

use crate::auth::identity::UserIdentity;
use crate::auth::random_urlsafe;
use crate::config::SessionConfig;
use crate::error::{RelayError, Result};

/// Path the `state` cookie is sent on; covers `/auth/google/callback`.
const STATE_COOKIE_PATH: &str = "/auth/google";

/// Data held for one signed-in browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// Identity established by a completed callback
    pub user: Option<UserIdentity>,
}

/// Backend storing session data by id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionData>>;
    async fn save(&self, id: &str, data: SessionData) -> Result<()>;
    async fn destroy(&self, id: &str) -> Result<()>;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, id: &str, data: SessionData) -> Result<()> {
        self.sessions.write().await.insert(id.to_string(), data);
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

/// A loaded session and its id.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub data: SessionData,
}

/// Session handling shared by handlers and guards: reads the request
/// cookies, talks to the store, and builds `Set-Cookie` values.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    state_cookie_name: String,
    state_max_age: u64,
    secure: bool,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            cookie_name: config.cookie_name.clone(),
            state_cookie_name: config.state_cookie_name.clone(),
            state_max_age: config.state_max_age_seconds,
            secure: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Loads the session referenced by the request's cookie, if any.
    ///
    /// A cookie pointing at an unknown session is treated as no session.
    pub async fn current(&self, headers: &HeaderMap) -> Result<Option<Session>> {
        let Some(id) = cookie_value(headers, &self.cookie_name) else {
            return Ok(None);
        };
        Ok(self
            .store
            .load(&id)
            .await?
            .map(|data| Session { id, data }))
    }

    /// Stores `data` under a fresh session id, destroying `previous`. Used on
    /// sign-in so a pre-login session id never becomes authenticated.
    pub async fn regenerate(
        &self,
        previous: Option<&str>,
        data: SessionData,
    ) -> Result<(String, HeaderValue)> {
        if let Some(id) = previous {
            self.store.destroy(id).await?;
        }
        let id = random_urlsafe(32);
        self.store.save(&id, data).await?;
        let cookie = self.cookie(&self.cookie_name, &id, "/", None)?;
        Ok((id, cookie))
    }

    /// Destroys the request's session. Returns the `Set-Cookie` value that
    /// clears the cookie in the browser, or `None` when there was no session
    /// cookie.
    pub async fn end(&self, headers: &HeaderMap) -> Result<Option<HeaderValue>> {
        let Some(id) = cookie_value(headers, &self.cookie_name) else {
            return Ok(None);
        };
        self.store.destroy(&id).await?;
        Ok(Some(self.cookie(&self.cookie_name, "", "/", Some(0))?))
    }

    /// `Set-Cookie` value carrying the CSRF `state` of a new sign-in.
    pub fn issue_state(&self, nonce: &str) -> Result<HeaderValue> {
        self.cookie(
            &self.state_cookie_name,
            nonce,
            STATE_COOKIE_PATH,
            Some(self.state_max_age),
        )
    }

    /// The `state` of the sign-in this browser started, if any.
    pub fn pending_state(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.state_cookie_name)
    }

    /// `Set-Cookie` value that drops the `state` cookie once a callback has
    /// been handled.
    pub fn clear_state(&self) -> Result<HeaderValue> {
        self.cookie(&self.state_cookie_name, "", STATE_COOKIE_PATH, Some(0))
    }

    fn cookie(
        &self,
        name: &str,
        value: &str,
        path: &str,
        max_age: Option<u64>,
    ) -> Result<HeaderValue> {
        let mut cookie = format!("{name}={value}; Path={path}; HttpOnly; SameSite=Lax");
        if let Some(seconds) = max_age {
            cookie.push_str(&format!("; Max-Age={seconds}"));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| RelayError::Session(format!("invalid cookie {name}: {e}")).into())
    }
}

/// Extracts the value of cookie `name` from every `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Reads the value cookie `name` is set to by a response's `Set-Cookie`
/// headers. A clearing cookie yields an empty string.
///
/// Handy for clients (and tests) that replay cookies on later requests.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
