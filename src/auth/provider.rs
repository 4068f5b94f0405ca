//! Identity provider client
//!
//! [`IdentityProvider`] is the seam between the HTTP handlers and the OAuth
//! 2.0 authorization code flow. [`GoogleProvider`] implements it against
//! Google's endpoints:
//!
//! 1. Build the consent URL (`response_type=code`, requested scopes,
//!    `prompt=select_account`, CSRF `state`).
//! 2. Exchange the returned `code` at the token endpoint using the
//!    confidential client credentials.
//! 3. Fetch the profile from the userinfo endpoint with the new access token.
//!
//! Every failure is reported as [`RelayError::Authentication`]; the callback
//! handler turns it into a plain redirect so no provider detail reaches the
//! browser.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::auth::identity::{ProviderGrant, ProviderProfile};
use crate::config::GoogleConfig;
use crate::error::{RelayError, Result};

/// OAuth 2.0 authorization code flow against an external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent screen URL carrying the given CSRF `state`.
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Exchanges an authorization code for an access token and the user's
    /// profile.
    async fn exchange_code(&self, code: &str) -> Result<ProviderGrant>;
}

/// Raw JSON response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Subset of the OpenID Connect userinfo document.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl UserInfo {
    fn into_profile(self) -> Result<ProviderProfile> {
        let email = self.email.filter(|e| !e.is_empty()).ok_or_else(|| {
            RelayError::Authentication("profile does not include an email address".to_string())
        })?;
        Ok(ProviderProfile {
            id: self.sub,
            display_name: self.name.unwrap_or_default(),
            email,
        })
    }
}

/// Google OAuth 2.0 client.
///
/// # Examples
///
/// ```
/// use oauth_relay::auth::provider::{GoogleProvider, IdentityProvider};
/// use oauth_relay::config::GoogleConfig;
///
/// let config = GoogleConfig {
///     client_id: "my-client".to_string(),
///     client_secret: "my-secret".to_string(),
///     ..GoogleConfig::default()
/// };
/// let provider = GoogleProvider::new(reqwest::Client::new(), config);
/// let url = provider.authorization_url("xyz").unwrap();
/// assert!(url.contains("prompt=select_account"));
/// ```
pub struct GoogleProvider {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleProvider {
    pub fn new(http: reqwest::Client, config: GoogleConfig) -> Self {
        Self { http, config }
    }

    async fn request_token(&self, code: &str) -> Result<TokenResponse> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", &self.config.callback_url);
        params.insert("client_id", &self.config.client_id);
        params.insert("client_secret", &self.config.client_secret);

        let resp = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| RelayError::Authentication(format!("token exchange request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Authentication(format!(
                "token endpoint returned {status}: {body}"
            ))
            .into());
        }

        resp.json().await.map_err(|e| {
            RelayError::Authentication(format!("failed to parse token response: {e}")).into()
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let resp = self
            .http
            .get(&self.config.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| RelayError::Authentication(format!("userinfo request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(
                RelayError::Authentication(format!("userinfo endpoint returned {status}")).into(),
            );
        }

        let info: UserInfo = resp.json().await.map_err(|e| {
            RelayError::Authentication(format!("failed to parse userinfo response: {e}"))
        })?;
        info.into_profile()
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.authorization_endpoint).map_err(|e| {
            RelayError::Config(format!("invalid authorization endpoint URL: {e}"))
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("prompt", &self.config.prompt)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderGrant> {
        let token = self.request_token(code).await?;
        tracing::debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "Exchanged authorization code"
        );

        let profile = self.fetch_profile(&token.access_token).await?;
        Ok(ProviderGrant {
            access_token: token.access_token,
            profile,
        })
    }
}
