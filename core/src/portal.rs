//! Tenant admin portal endpoint.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl FromStr for Scheme {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(RequestError::InvalidPortal {
                url: s.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

/// Scheme, host and port of a tenant's admin portal.
///
/// Every request URL is resolved against this endpoint. The base URL is
/// validated once at construction so building requests cannot fail on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPortal {
    scheme: Scheme,
    host: String,
    port: u16,
    base: Url,
}

impl AdminPortal {
    pub fn new(scheme: Scheme, host: &str, port: u16) -> Result<Self, RequestError> {
        let raw = format!("{}://{host}:{port}", scheme.as_str());
        if host.trim().is_empty() {
            return Err(RequestError::InvalidPortal {
                url: raw,
                reason: "host must not be empty".to_string(),
            });
        }
        let base = Url::parse(&raw).map_err(|e| RequestError::InvalidPortal {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            base,
        })
    }

    /// Parse `scheme://host[:port]`. Paths, queries and fragments are rejected.
    pub fn parse(url: &str) -> Result<Self, RequestError> {
        let invalid = |reason: String| RequestError::InvalidPortal {
            url: url.to_string(),
            reason,
        };
        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        let scheme: Scheme = parsed.scheme().parse().map_err(|_| {
            invalid(format!("unsupported scheme '{}'", parsed.scheme()))
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("admin portal URL must not carry a path, query or fragment".to_string()));
        }
        let port = parsed.port().unwrap_or_else(|| scheme.default_port());
        Self::new(scheme, host, port)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL with an empty path, e.g. `https://acme-admin.3scale.net/`.
    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

impl fmt::Display for AdminPortal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}
