//! Credentials attached to every admin API request.

use std::fmt;

/// Secret used to authenticate against the admin API.
///
/// Sent as a query parameter whose name depends on the kind of secret.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Personal access token, sent as `access_token`.
    AccessToken(String),
    /// Legacy provider key, sent as `provider_key`.
    ProviderKey(String),
}

impl Credential {
    pub fn access_token(token: impl Into<String>) -> Self {
        Credential::AccessToken(token.into())
    }

    pub fn provider_key(key: impl Into<String>) -> Self {
        Credential::ProviderKey(key.into())
    }

    pub fn param_name(&self) -> &'static str {
        match self {
            Credential::AccessToken(_) => "access_token",
            Credential::ProviderKey(_) => "provider_key",
        }
    }

    pub(crate) fn secret(&self) -> &str {
        match self {
            Credential::AccessToken(secret) | Credential::ProviderKey(secret) => secret,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Credential::AccessToken(_) => "AccessToken",
            Credential::ProviderKey(_) => "ProviderKey",
        };
        f.debug_tuple(kind).field(&"<redacted>").finish()
    }
}
