//! OAuth relay - hands a Google sign-in to a local desktop application
//!
//! The relay runs a small web server that drives the Google OAuth 2.0
//! authorization code flow in the user's browser. When the callback arrives
//! it registers the provider's access token as a bearer token, establishes a
//! browser session, and notifies the desktop application listening on a
//! loopback port. The desktop application then resolves the signed-in user by
//! calling `/api/user` with that bearer token.
//!
//! # Architecture
//!
//! - `auth`: identities, the Google provider client, the bearer token
//!   registry, browser sessions, and the two authentication guards
//! - `notifier`: background hand-off of new tokens to the desktop application
//! - `server`: router, handlers, and server lifecycle
//! - `config`: configuration loading and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use oauth_relay::{Config, cli::Cli};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/relay.yaml", &Cli::default())?;
//!     config.validate()?;
//!     oauth_relay::server::serve(config).await
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod notifier;
pub mod server;

// Re-export commonly used types
pub use auth::identity::{PublicIdentity, UserIdentity};
pub use auth::token_store::{InMemoryTokenStore, TokenStore};
pub use config::Config;
pub use error::{ApiError, RelayError, Result};
pub use notifier::{LocalAppNotifier, NotifyOutcome};
pub use server::{build_router, AppState};
