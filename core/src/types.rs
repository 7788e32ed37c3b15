//! Admin API resources.
//!
//! # Design
//! These types mirror the portal's schemas but keep only the fields callers
//! use; unknown fields are ignored. Each top-level type implements
//! [`Resource`], which fixes its wire format. Applications and proxy
//! configurations travel as JSON wrapped in a single-key envelope
//! (`{"application": {...}}`); services travel as XML.

use serde::{Deserialize, Serialize};

use crate::decode::{Resource, WireFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// An application subscribed to a service plan by a developer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub state: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub end_user_required: bool,
    pub service_id: i64,
    pub plan_id: i64,
    pub account_id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub first_traffic_at: Option<String>,
    #[serde(default)]
    pub first_daily_traffic_at: Option<String>,
    /// Present for user-key authenticated services.
    #[serde(default)]
    pub user_key: Option<String>,
    /// Present for app-id/app-key authenticated services.
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub provider_verification_key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationItem {
    pub application: Application,
}

impl Resource for ApplicationItem {
    const WIRE_FORMAT: WireFormat = WireFormat::Json;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<ApplicationItem>,
}

impl Resource for ApplicationList {
    const WIRE_FORMAT: WireFormat = WireFormat::Json;
}

/// Form parameters for creating an application.
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication<'a> {
    pub plan_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
}

/// Form parameters for updating an application. Omitted fields are left
/// unchanged by the portal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An API product managed by the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "service")]
pub struct Service {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub state: String,
    pub system_name: String,
    #[serde(default)]
    pub backend_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for Service {
    const WIRE_FORMAT: WireFormat = WireFormat::Xml;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "services")]
pub struct ServiceList {
    #[serde(rename = "service", default)]
    pub services: Vec<Service>,
}

impl Resource for ServiceList {
    const WIRE_FORMAT: WireFormat = WireFormat::Xml;
}

/// Form parameters for creating a service.
#[derive(Debug, Clone, Serialize)]
pub struct NewService<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

/// Gateway environment a proxy configuration is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub id: i64,
    pub version: i64,
    pub environment: Environment,
    pub content: ProxyConfigContent,
}

/// Service snapshot embedded in a proxy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfigContent {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub backend_version: Option<String>,
    #[serde(default)]
    pub backend_authentication_type: Option<String>,
    #[serde(default)]
    pub backend_authentication_value: Option<String>,
    pub proxy: Proxy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    pub id: i64,
    pub service_id: i64,
    pub endpoint: String,
    #[serde(default)]
    pub sandbox_endpoint: Option<String>,
    pub api_backend: Option<String>,
    #[serde(default)]
    pub credentials_location: Option<String>,
    #[serde(default)]
    pub auth_app_key: Option<String>,
    #[serde(default)]
    pub auth_app_id: Option<String>,
    #[serde(default)]
    pub auth_user_key: Option<String>,
    #[serde(default)]
    pub error_auth_failed: Option<String>,
    #[serde(default)]
    pub error_status_auth_failed: Option<u16>,
    #[serde(default)]
    pub error_auth_missing: Option<String>,
    #[serde(default)]
    pub error_status_auth_missing: Option<u16>,
    #[serde(default)]
    pub error_no_match: Option<String>,
    #[serde(default)]
    pub error_status_no_match: Option<u16>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub backend: Option<Backend>,
    #[serde(default)]
    pub policy_chain: Vec<Policy>,
    #[serde(default)]
    pub proxy_rules: Vec<ProxyRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    pub endpoint: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

/// Mapping rule from a request pattern to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRule {
    pub id: i64,
    pub http_method: String,
    pub pattern: String,
    pub metric_id: i64,
    #[serde(default)]
    pub metric_system_name: Option<String>,
    pub delta: i64,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfigItem {
    pub proxy_config: ProxyConfig,
}

impl Resource for ProxyConfigItem {
    const WIRE_FORMAT: WireFormat = WireFormat::Json;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfigList {
    #[serde(default)]
    pub proxy_configs: Vec<ProxyConfigItem>,
}

impl Resource for ProxyConfigList {
    const WIRE_FORMAT: WireFormat = WireFormat::Json;
}
