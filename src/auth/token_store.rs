//! Bearer token registry
//!
//! Maps each issued bearer token to the identity it was issued for. The
//! registry is process-wide, created once at startup and shared with the
//! handlers through the router state. Entries never expire and are never
//! removed; logging out only ends the browser session.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::identity::UserIdentity;

/// Storage for issued bearer tokens.
///
/// Implementations key each identity by its own `token` field, so the
/// key/value invariant holds by construction.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Records `identity` under `identity.token`, replacing any previous
    /// entry for the same token.
    async fn put(&self, identity: UserIdentity);

    /// Looks up the identity issued for `token`.
    async fn get(&self, token: &str) -> Option<UserIdentity>;

    /// Number of tokens currently known.
    async fn len(&self) -> usize;

    /// Returns `true` when no token has been issued yet.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Unbounded in-memory [`TokenStore`] that lives as long as the process.
///
/// # Examples
///
/// ```
/// use oauth_relay::auth::identity::UserIdentity;
/// use oauth_relay::auth::token_store::{InMemoryTokenStore, TokenStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = InMemoryTokenStore::new();
/// store
///     .put(UserIdentity {
///         id: "1".to_string(),
///         display_name: "Ada".to_string(),
///         email: "ada@example.com".to_string(),
///         token: "tok".to_string(),
///     })
///     .await;
/// assert_eq!(store.get("tok").await.unwrap().id, "1");
/// assert!(store.get("other").await.is_none());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    entries: RwLock<HashMap<String, UserIdentity>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put(&self, identity: UserIdentity) {
        let mut entries = self.entries.write().await;
        entries.insert(identity.token.clone(), identity);
    }

    async fn get(&self, token: &str) -> Option<UserIdentity> {
        self.entries.read().await.get(token).cloned()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
