//! Configuration management for the OAuth relay
//!
//! Configuration is loaded from an optional YAML file, then overridden by
//! environment variables and finally by CLI flags. Every default matches the
//! fixed values the desktop application expects (port 3002, local listener on
//! port 8888, Vite dev origin), so a missing file is a valid setup as long as
//! the Google client credentials come from the environment.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Google OAuth client settings
    #[serde(default)]
    pub google: GoogleConfig,
    /// Local desktop application notification settings
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Browser session cookie settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `index.html` and other static assets
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// The single origin allowed to make credentialed cross-origin requests
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

/// Google OAuth 2.0 client configuration
///
/// The endpoint URLs are configurable so tests can point the provider at a
/// mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id; normally supplied through `GOOGLE_CLIENT_ID`
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret; normally supplied through `GOOGLE_CLIENT_SECRET`
    #[serde(default)]
    pub client_secret: String,

    /// Redirect URI registered with Google
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Consent screen endpoint
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    /// Code exchange endpoint
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Profile endpoint queried with the freshly issued access token
    #[serde(default = "default_userinfo_endpoint")]
    pub userinfo_endpoint: String,

    /// Scopes requested on the consent screen
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// `prompt` parameter; `select_account` forces the account chooser
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_callback_url() -> String {
    "http://localhost:3002/auth/google/callback".to_string()
}

fn default_authorization_endpoint() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_endpoint() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_endpoint() -> String {
    "https://www.googleapis.com/oauth2/v3/userinfo".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["profile".to_string(), "email".to_string()]
}

fn default_prompt() -> String {
    "select_account".to_string()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: default_callback_url(),
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
            userinfo_endpoint: default_userinfo_endpoint(),
            scopes: default_scopes(),
            prompt: default_prompt(),
        }
    }
}

/// Local desktop application notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Loopback URL of the desktop listener; `token` is appended as a query
    /// parameter
    #[serde(default = "default_notifier_url")]
    pub callback_url: String,

    /// Upper bound on the whole notification request (seconds)
    #[serde(default = "default_notifier_timeout")]
    pub timeout_seconds: u64,
}

fn default_notifier_url() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_notifier_timeout() -> u64 {
    10
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            callback_url: default_notifier_url(),
            timeout_seconds: default_notifier_timeout(),
        }
    }
}

/// Browser session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie carrying the session id
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie carrying the CSRF `state` of a sign-in in progress
    #[serde(default = "default_state_cookie_name")]
    pub state_cookie_name: String,

    /// Lifetime of the `state` cookie; a sign-in must finish within it
    #[serde(default = "default_state_max_age")]
    pub state_max_age_seconds: u64,

    /// Add the `Secure` attribute; leave off for plain-HTTP localhost
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_cookie_name() -> String {
    "relay.sid".to_string()
}

fn default_state_cookie_name() -> String {
    "relay.oauth_state".to_string()
}

fn default_state_max_age() -> u64 {
    600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            state_cookie_name: default_state_cookie_name(),
            state_max_age_seconds: default_state_max_age(),
            secure_cookie: false,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI overrides
    ///
    /// A missing file is not an error; defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(RelayError::Io)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(RelayError::Yaml)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(client_id) = std::env::var("GOOGLE_CLIENT_ID") {
            self.google.client_id = client_id;
        }

        if let Ok(client_secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = client_secret;
        }

        if let Ok(port) = std::env::var("OAUTH_RELAY_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid OAUTH_RELAY_PORT: {}", port);
            }
        }

        if let Ok(origin) = std::env::var("OAUTH_RELAY_ALLOWED_ORIGIN") {
            self.server.allowed_origin = origin;
        }

        if let Ok(url) = std::env::var("OAUTH_RELAY_NOTIFIER_URL") {
            self.notifier.callback_url = url;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.google.client_id.trim().is_empty() {
            return Err(RelayError::Config(
                "google.client_id is required (set GOOGLE_CLIENT_ID)".to_string(),
            )
            .into());
        }

        if self.google.client_secret.trim().is_empty() {
            return Err(RelayError::Config(
                "google.client_secret is required (set GOOGLE_CLIENT_SECRET)".to_string(),
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(RelayError::Config("server.port must be greater than 0".to_string()).into());
        }

        if self.google.scopes.is_empty() {
            return Err(
                RelayError::Config("google.scopes must not be empty".to_string()).into(),
            );
        }

        if self.notifier.timeout_seconds == 0 {
            return Err(RelayError::Config(
                "notifier.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.cookie_name == self.session.state_cookie_name {
            return Err(RelayError::Config(
                "session.state_cookie_name must differ from session.cookie_name".to_string(),
            )
            .into());
        }

        if self.session.state_max_age_seconds == 0 {
            return Err(RelayError::Config(
                "session.state_max_age_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let urls = [
            ("server.allowed_origin", &self.server.allowed_origin),
            ("google.callback_url", &self.google.callback_url),
            (
                "google.authorization_endpoint",
                &self.google.authorization_endpoint,
            ),
            ("google.token_endpoint", &self.google.token_endpoint),
            ("google.userinfo_endpoint", &self.google.userinfo_endpoint),
            ("notifier.callback_url", &self.notifier.callback_url),
        ];
        for (field, value) in urls {
            if let Err(e) = Url::parse(value) {
                return Err(RelayError::Config(format!("{field} is not a valid URL: {e}")).into());
            }
        }

        Ok(())
    }
}
