// SPDX-License-Identifier: MIT

//! External identity and internal user types.
//!
//! Every message and store call is shaped by these closed enums; there is
//! no dictionary-style field probing anywhere. A provider variant carries
//! exactly the fields that provider's adapter is required to supply, so
//! missing mandatory fields fail at deserialization, before any handler
//! runs.

use serde::{Deserialize, Serialize};

/// Which external authenticator verified a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
    Twitter,
    BrowserId,
    Api,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
            Provider::Twitter => "twitter",
            Provider::BrowserId => "browserid",
            Provider::Api => "api",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal user identity. Created exactly once per distinct external
/// identity, never mutated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique token generated by the store (uuid4 hex)
    pub user_id: String,
    /// Role reference; roles are schema-only in current scope
    pub role_id: String,
}

/// A verified external identity together with the profile attributes
/// captured at first login. Profile fields are recorded at creation time
/// and never refreshed on subsequent logins.
///
/// Field sets per provider match what each adapter verifies: Google only
/// guarantees an email, Facebook supplies a full profile, Twitter a
/// username and avatar, BrowserID just the asserted email. An `api`
/// identity is a pre-issued secret key and carries no profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum ExternalIdentity {
    Google {
        email: String,
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        locale: Option<String>,
    },
    Facebook {
        id: String,
        link: String,
        access_token: String,
        locale: String,
        first_name: String,
        last_name: String,
        name: String,
        picture: String,
    },
    Twitter {
        username: String,
        profile_image_url: String,
    },
    BrowserId {
        email: String,
    },
    Api {
        secret_key: String,
    },
}

impl ExternalIdentity {
    pub fn provider(&self) -> Provider {
        match self {
            ExternalIdentity::Google { .. } => Provider::Google,
            ExternalIdentity::Facebook { .. } => Provider::Facebook,
            ExternalIdentity::Twitter { .. } => Provider::Twitter,
            ExternalIdentity::BrowserId { .. } => Provider::BrowserId,
            ExternalIdentity::Api { .. } => Provider::Api,
        }
    }

    /// The (provider, key) pair that uniquely identifies this identity.
    pub fn key(&self) -> ProviderKey {
        match self {
            ExternalIdentity::Google { email, .. } => ProviderKey::Google {
                email: email.clone(),
            },
            ExternalIdentity::Facebook { id, .. } => ProviderKey::Facebook { id: id.clone() },
            ExternalIdentity::Twitter { username, .. } => ProviderKey::Twitter {
                username: username.clone(),
            },
            ExternalIdentity::BrowserId { email } => ProviderKey::BrowserId {
                email: email.clone(),
            },
            ExternalIdentity::Api { secret_key } => ProviderKey::Api {
                secret_key: secret_key.clone(),
            },
        }
    }
}

/// The provider-specific unique key used for lookups, without profile
/// attributes. Same identity spaces as [`ExternalIdentity`]: the pair
/// (provider, key) is the unique index, so the same-looking key under two
/// providers names two independent identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum ProviderKey {
    Google { email: String },
    Facebook { id: String },
    Twitter { username: String },
    BrowserId { email: String },
    Api { secret_key: String },
}

impl ProviderKey {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderKey::Google { .. } => Provider::Google,
            ProviderKey::Facebook { .. } => Provider::Facebook,
            ProviderKey::Twitter { .. } => Provider::Twitter,
            ProviderKey::BrowserId { .. } => Provider::BrowserId,
            ProviderKey::Api { .. } => Provider::Api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Provider::BrowserId).unwrap(),
            "\"browserid\""
        );
        assert_eq!(serde_json::to_string(&Provider::Api).unwrap(), "\"api\"");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result: Result<Provider, _> = serde_json::from_str("\"myspace\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_identity_key_strips_profile() {
        let identity = ExternalIdentity::Google {
            email: "a@x.com".to_string(),
            first_name: Some("A".to_string()),
            last_name: None,
            name: None,
            locale: None,
        };
        assert_eq!(
            identity.key(),
            ProviderKey::Google {
                email: "a@x.com".to_string()
            }
        );
        assert_eq!(identity.provider(), Provider::Google);
    }

    #[test]
    fn test_facebook_requires_full_profile() {
        // Facebook adapters must supply the complete profile
        let result: Result<ExternalIdentity, _> =
            serde_json::from_str(r#"{"user_type":"facebook","id":"123"}"#);
        assert!(result.is_err());
    }
}
