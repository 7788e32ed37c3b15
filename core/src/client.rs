//! Resource operations of the admin API.
//!
//! # Design
//! `ThreeScaleClient` owns the tenant's [`AdminPortal`], the [`Credential`] and
//! a shared [`Transport`]. Every operation is the same three steps: describe
//! the call with a [`RequestBuilder`], hand it to the transport, decode the
//! response. There is no state shared between calls, so a client can be
//! cloned or shared across threads freely.

use std::sync::Arc;

use tracing::debug;

use crate::credential::Credential;
use crate::decode::{decode, decode_empty, Resource};
use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse};
use crate::portal::AdminPortal;
use crate::request::RequestBuilder;
use crate::transport::Transport;
use crate::types::{
    Application, ApplicationItem, ApplicationList, ApplicationUpdate, Environment, NewApplication,
    NewService, ProxyConfig, ProxyConfigItem, ProxyConfigList, Service, ServiceList,
};

const APPLICATIONS: &str = "/admin/api/accounts/{account_id}/applications.json";
const APPLICATION: &str = "/admin/api/accounts/{account_id}/applications/{application_id}.json";
const SERVICES: &str = "/admin/api/services.xml";
const SERVICE: &str = "/admin/api/services/{service_id}.xml";
const PROXY_CONFIGS: &str = "/admin/api/services/{service_id}/proxy/configs/{environment}.json";
const PROXY_CONFIG_LATEST: &str =
    "/admin/api/services/{service_id}/proxy/configs/{environment}/latest.json";
const PROXY_CONFIG: &str =
    "/admin/api/services/{service_id}/proxy/configs/{environment}/{version}.json";
const PROXY_CONFIG_PROMOTE: &str =
    "/admin/api/services/{service_id}/proxy/configs/{environment}/{version}/promote.json";

/// Typed client for a tenant's admin API.
#[derive(Clone)]
pub struct ThreeScaleClient {
    portal: AdminPortal,
    credential: Credential,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ThreeScaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreeScaleClient")
            .field("portal", &self.portal)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl ThreeScaleClient {
    pub fn new(portal: AdminPortal, credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self {
            portal,
            credential,
            transport,
        }
    }

    /// Client using the blocking `ureq` transport configured by `config`.
    #[cfg(feature = "ureq")]
    pub fn from_config(config: crate::config::ClientConfig) -> Self {
        let transport = crate::transport::UreqTransport::with_config(&config.transport);
        Self::new(config.portal, config.credential, Arc::new(transport))
    }

    pub fn portal(&self) -> &AdminPortal {
        &self.portal
    }

    /// Build, send and decode a call whose response body is a `T`.
    pub fn call<T: Resource>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let request = builder.accept(T::WIRE_FORMAT).build(&self.portal, &self.credential)?;
        let response = self.send(request)?;
        let decoded = decode::<T>(response)?;
        debug!("decoded {} response", T::WIRE_FORMAT);
        Ok(decoded)
    }

    /// Build, send and check a call whose response body is ignored.
    pub fn call_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        let request = builder.build(&self.portal, &self.credential)?;
        let response = self.send(request)?;
        decode_empty(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = %request.method, path = request.path(), "sending admin API request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "admin API responded");
        Ok(response)
    }

    // --- applications ---

    /// `POST /admin/api/accounts/{account_id}/applications.json`
    pub fn create_app(
        &self,
        account_id: i64,
        plan_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Application, ClientError> {
        let params = NewApplication {
            plan_id,
            name,
            description,
        };
        let builder = RequestBuilder::post(APPLICATIONS)
            .path_param("account_id", account_id)
            .form(&params)?;
        self.call::<ApplicationItem>(builder).map(|item| item.application)
    }

    /// `GET /admin/api/accounts/{account_id}/applications.json`
    ///
    /// Entries keep the order the portal returned them in.
    pub fn list_applications(&self, account_id: i64) -> Result<Vec<Application>, ClientError> {
        let builder = RequestBuilder::get(APPLICATIONS).path_param("account_id", account_id);
        let list: ApplicationList = self.call(builder)?;
        Ok(list.applications.into_iter().map(|item| item.application).collect())
    }

    /// `GET /admin/api/accounts/{account_id}/applications/{application_id}.json`
    pub fn read_application(&self, account_id: i64, application_id: i64) -> Result<Application, ClientError> {
        let builder = RequestBuilder::get(APPLICATION)
            .path_param("account_id", account_id)
            .path_param("application_id", application_id);
        self.call::<ApplicationItem>(builder).map(|item| item.application)
    }

    /// `PUT /admin/api/accounts/{account_id}/applications/{application_id}.json`
    pub fn update_application(
        &self,
        account_id: i64,
        application_id: i64,
        update: &ApplicationUpdate,
    ) -> Result<Application, ClientError> {
        let builder = RequestBuilder::put(APPLICATION)
            .path_param("account_id", account_id)
            .path_param("application_id", application_id)
            .form(update)?;
        self.call::<ApplicationItem>(builder).map(|item| item.application)
    }

    /// `DELETE /admin/api/accounts/{account_id}/applications/{application_id}.json`
    pub fn delete_application(&self, account_id: i64, application_id: i64) -> Result<(), ClientError> {
        let builder = RequestBuilder::delete(APPLICATION)
            .path_param("account_id", account_id)
            .path_param("application_id", application_id);
        self.call_empty(builder)
    }

    // --- services (XML) ---

    pub fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        let list: ServiceList = self.call(RequestBuilder::get(SERVICES))?;
        Ok(list.services)
    }

    pub fn read_service(&self, service_id: i64) -> Result<Service, ClientError> {
        self.call(RequestBuilder::get(SERVICE).path_param("service_id", service_id))
    }

    pub fn create_service(&self, service: &NewService<'_>) -> Result<Service, ClientError> {
        self.call(RequestBuilder::post(SERVICES).form(service)?)
    }

    pub fn delete_service(&self, service_id: i64) -> Result<(), ClientError> {
        self.call_empty(RequestBuilder::delete(SERVICE).path_param("service_id", service_id))
    }

    // --- proxy configurations ---

    /// All proxy configuration versions deployed to `environment`.
    pub fn list_proxy_configs(
        &self,
        service_id: i64,
        environment: Environment,
    ) -> Result<Vec<ProxyConfig>, ClientError> {
        let builder = RequestBuilder::get(PROXY_CONFIGS)
            .path_param("service_id", service_id)
            .path_param("environment", environment);
        let list: ProxyConfigList = self.call(builder)?;
        Ok(list.proxy_configs.into_iter().map(|item| item.proxy_config).collect())
    }

    pub fn get_latest_proxy_config(
        &self,
        service_id: i64,
        environment: Environment,
    ) -> Result<ProxyConfig, ClientError> {
        let builder = RequestBuilder::get(PROXY_CONFIG_LATEST)
            .path_param("service_id", service_id)
            .path_param("environment", environment);
        self.call::<ProxyConfigItem>(builder).map(|item| item.proxy_config)
    }

    pub fn get_proxy_config(
        &self,
        service_id: i64,
        environment: Environment,
        version: i64,
    ) -> Result<ProxyConfig, ClientError> {
        let builder = RequestBuilder::get(PROXY_CONFIG)
            .path_param("service_id", service_id)
            .path_param("environment", environment)
            .path_param("version", version);
        self.call::<ProxyConfigItem>(builder).map(|item| item.proxy_config)
    }

    /// Promote configuration `version` from `from` to `to`.
    pub fn promote_proxy_config(
        &self,
        service_id: i64,
        from: Environment,
        version: i64,
        to: Environment,
    ) -> Result<ProxyConfig, ClientError> {
        let builder = RequestBuilder::post(PROXY_CONFIG_PROMOTE)
            .path_param("service_id", service_id)
            .path_param("environment", from)
            .path_param("version", version)
            .form(&[("to", to.as_str())])?;
        self.call::<ProxyConfigItem>(builder).map(|item| item.proxy_config)
    }
}
