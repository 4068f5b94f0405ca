//! Identity records produced by a successful sign-in

use serde::{Deserialize, Serialize};

/// Profile fields returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider subject identifier
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Primary email address
    pub email: String,
}

/// Result of a completed authorization-code exchange.
#[derive(Debug, Clone)]
pub struct ProviderGrant {
    /// Access token issued by the provider; doubles as the relay's bearer token
    pub access_token: String,
    /// Profile of the signed-in user
    pub profile: ProviderProfile,
}

/// An authenticated user together with the bearer token that identifies it.
///
/// Serialized in camelCase because `/user` returns it to browser code
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub token: String,
}

impl UserIdentity {
    /// Builds the identity for a completed exchange. The access token becomes
    /// the bearer token; no separate credential is minted.
    pub fn from_grant(grant: ProviderGrant) -> Self {
        Self {
            id: grant.profile.id,
            display_name: grant.profile.display_name,
            email: grant.profile.email,
            token: grant.access_token,
        }
    }

    /// The view returned by the bearer-token lookup, which never echoes the
    /// token.
    pub fn public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Identity without its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub id: String,
    pub display_name: String,
    pub email: String,
}
