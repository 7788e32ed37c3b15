//! Client configuration.
//!
//! `ClientConfig::from_env` reads:
//! - `THREESCALE_ADMIN_PORTAL`: admin portal URL, e.g. `https://acme-admin.3scale.net`
//! - `THREESCALE_ACCESS_TOKEN`: personal access token
//! - `THREESCALE_TIMEOUT_SECS`: optional whole-request timeout

use std::time::Duration;

use thiserror::Error;

use crate::credential::Credential;
use crate::error::RequestError;
use crate::portal::AdminPortal;

pub const PORTAL_VAR: &str = "THREESCALE_ADMIN_PORTAL";
pub const ACCESS_TOKEN_VAR: &str = "THREESCALE_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "THREESCALE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Portal(#[from] RequestError),
}

/// Settings applied to the production transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for a whole round trip. `None` disables the timeout.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: concat!("porta-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub portal: AdminPortal,
    pub credential: Credential,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let portal = AdminPortal::parse(required(PORTAL_VAR)?.trim())?;
        let credential = Credential::AccessToken(required(ACCESS_TOKEN_VAR)?);

        let mut transport = TransportConfig::default();
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: TIMEOUT_VAR,
                reason: e.to_string(),
            })?;
            transport.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(Self {
            portal,
            credential,
            transport,
        })
    }
}
