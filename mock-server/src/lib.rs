use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEVELOPER_ACCOUNT_ID: i64 = 2;
pub const ECHO_SERVICE_ID: i64 = 1;
pub const DEFAULT_PLAN_ID: i64 = 10;

const FORBIDDEN_MESSAGE: &str = "Your access token does not have the correct permissions";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub state: String,
    pub enabled: bool,
    pub service_id: i64,
    pub plan_id: i64,
    pub account_id: i64,
    pub user_key: String,
    pub name: String,
    pub description: String,
}

/// Rendered as the `<service>` element of the XML admin API.
#[derive(Clone, Debug, Serialize)]
#[serde(rename = "service")]
pub struct Service {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub state: String,
    pub system_name: String,
    pub backend_version: String,
    pub description: String,
}

impl Service {
    fn new(id: i64, name: String, system_name: String, description: String) -> Self {
        Self {
            id,
            account_id: 1,
            name,
            state: "incomplete".to_string(),
            system_name,
            backend_version: "1".to_string(),
            description,
        }
    }
}

#[derive(Serialize)]
#[serde(rename = "services")]
struct ServiceList<'a> {
    #[serde(rename = "service")]
    services: &'a [Service],
}

#[derive(Clone, Debug, Serialize)]
pub struct ProxyConfig {
    pub id: i64,
    pub version: i64,
    pub environment: String,
    pub content: Value,
}

#[derive(Deserialize)]
pub struct Auth {
    pub access_token: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateApplication {
    pub plan_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateApplication {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateService {
    pub name: String,
    pub system_name: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct Promote {
    pub to: String,
}

/// In-memory state of a single-tenant admin portal.
#[derive(Debug)]
pub struct Portal {
    access_token: String,
    next_id: i64,
    applications: Vec<Application>,
    services: Vec<Service>,
    proxy_configs: Vec<ProxyConfig>,
}

impl Portal {
    fn seeded(access_token: &str) -> Self {
        let echo = Service::new(
            ECHO_SERVICE_ID,
            "Echo API".to_string(),
            "echo-api".to_string(),
            String::new(),
        );
        let sandbox = ProxyConfig {
            id: 100,
            version: 1,
            environment: "sandbox".to_string(),
            content: proxy_content(&echo),
        };
        Self {
            access_token: access_token.to_string(),
            next_id: 1000,
            applications: Vec::new(),
            services: vec![echo],
            proxy_configs: vec![sandbox],
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Portal>>;

pub fn app(access_token: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Portal::seeded(access_token)));
    Router::new()
        .route(
            "/admin/api/accounts/{account_id}/applications.json",
            get(list_applications).post(create_application),
        )
        .route(
            "/admin/api/accounts/{account_id}/applications/{application_id}",
            get(read_application).put(update_application).delete(delete_application),
        )
        .route("/admin/api/services.xml", get(list_services).post(create_service))
        .route(
            "/admin/api/services/{service_id}",
            get(read_service).delete(delete_service),
        )
        .route(
            "/admin/api/services/{service_id}/proxy/configs/{environment}",
            get(list_proxy_configs),
        )
        .route(
            "/admin/api/services/{service_id}/proxy/configs/{environment}/{version}",
            get(read_proxy_config),
        )
        .route(
            "/admin/api/services/{service_id}/proxy/configs/{environment}/{version}/promote.json",
            post(promote_proxy_config),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener, access_token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(access_token)).await
}

// --- responses ---

fn json_error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn xml(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        format!(r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#),
    )
        .into_response()
}

fn not_found_json() -> Response {
    json_error(StatusCode::NOT_FOUND, json!({ "status": "Not found" }))
}

fn authorize(portal: &Portal, auth: &Auth) -> bool {
    auth.access_token.as_deref() == Some(portal.access_token.as_str())
}

/// Strip a `.json`/`.xml` suffix from a path segment and parse the id.
fn parse_id(segment: &str, suffix: &str) -> Option<i64> {
    segment.strip_suffix(suffix)?.parse().ok()
}

fn xml_resource<T: Serialize>(status: StatusCode, resource: &T) -> Response {
    match quick_xml::se::to_string(resource) {
        Ok(body) => xml(status, body),
        Err(err) => {
            tracing::error!(error = %err, "failed to render XML response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn proxy_content(service: &Service) -> Value {
    json!({
        "id": service.id,
        "account_id": service.account_id,
        "name": service.name,
        "system_name": service.system_name,
        "backend_version": "1",
        "proxy": {
            "id": service.id * 100,
            "service_id": service.id,
            "endpoint": "https://api-production.gw.example.com:443",
            "sandbox_endpoint": "https://api-staging.gw.example.com:443",
            "api_backend": "https://echo-api.3scale.net:443",
            "credentials_location": "query",
            "auth_user_key": "user_key",
            "hosts": ["api-production.gw.example.com", "api-staging.gw.example.com"],
            "policy_chain": [{ "name": "apicast", "version": "builtin", "configuration": {} }],
            "proxy_rules": [{
                "id": 1,
                "http_method": "GET",
                "pattern": "/",
                "metric_id": 1,
                "metric_system_name": "hits",
                "delta": 1
            }]
        }
    })
}

// --- applications ---

async fn list_applications(
    State(db): State<Db>,
    Path(account_id): Path<i64>,
    Query(auth): Query<Auth>,
) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    if account_id != DEVELOPER_ACCOUNT_ID {
        return not_found_json();
    }
    let applications: Vec<Value> = portal
        .applications
        .iter()
        .filter(|a| a.account_id == account_id)
        .map(|a| json!({ "application": a }))
        .collect();
    Json(json!({ "applications": applications })).into_response()
}

async fn create_application(
    State(db): State<Db>,
    Path(account_id): Path<i64>,
    Query(auth): Query<Auth>,
    Form(input): Form<CreateApplication>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    if account_id != DEVELOPER_ACCOUNT_ID {
        return not_found_json();
    }
    if input.plan_id.parse::<i64>() != Ok(DEFAULT_PLAN_ID) {
        return json_error(StatusCode::NOT_FOUND, json!({ "error": "Plan not found" }));
    }
    if input.name.trim().is_empty() {
        return json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "errors": { "name": ["can't be blank"] } }),
        );
    }
    if portal.applications.iter().any(|a| a.name == input.name) {
        return json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "errors": { "name": ["has already been taken"] } }),
        );
    }
    let id = portal.next_id();
    let application = Application {
        id,
        state: "live".to_string(),
        enabled: true,
        service_id: ECHO_SERVICE_ID,
        plan_id: DEFAULT_PLAN_ID,
        account_id,
        user_key: format!("{id:032x}"),
        name: input.name,
        description: input.description,
    };
    portal.applications.push(application.clone());
    (StatusCode::CREATED, Json(json!({ "application": application }))).into_response()
}

async fn read_application(
    State(db): State<Db>,
    Path((account_id, application_id)): Path<(i64, String)>,
    Query(auth): Query<Auth>,
) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let id = parse_id(&application_id, ".json");
    match portal
        .applications
        .iter()
        .find(|a| a.account_id == account_id && Some(a.id) == id)
    {
        Some(application) => Json(json!({ "application": application })).into_response(),
        None => not_found_json(),
    }
}

async fn update_application(
    State(db): State<Db>,
    Path((account_id, application_id)): Path<(i64, String)>,
    Query(auth): Query<Auth>,
    Form(input): Form<UpdateApplication>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let id = parse_id(&application_id, ".json");
    let Some(application) = portal
        .applications
        .iter_mut()
        .find(|a| a.account_id == account_id && Some(a.id) == id)
    else {
        return not_found_json();
    };
    if let Some(name) = input.name {
        application.name = name;
    }
    if let Some(description) = input.description {
        application.description = description;
    }
    Json(json!({ "application": application })).into_response()
}

async fn delete_application(
    State(db): State<Db>,
    Path((account_id, application_id)): Path<(i64, String)>,
    Query(auth): Query<Auth>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let id = parse_id(&application_id, ".json");
    let before = portal.applications.len();
    portal
        .applications
        .retain(|a| !(a.account_id == account_id && Some(a.id) == id));
    if portal.applications.len() == before {
        return not_found_json();
    }
    StatusCode::OK.into_response()
}

// --- services ---

async fn list_services(State(db): State<Db>, Query(auth): Query<Auth>) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return xml(StatusCode::FORBIDDEN, "<error>Access denied</error>".to_string());
    }
    xml_resource(
        StatusCode::OK,
        &ServiceList {
            services: &portal.services,
        },
    )
}

async fn create_service(
    State(db): State<Db>,
    Query(auth): Query<Auth>,
    Form(input): Form<CreateService>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return xml(StatusCode::FORBIDDEN, "<error>Access denied</error>".to_string());
    }
    let system_name = input
        .system_name
        .unwrap_or_else(|| input.name.to_lowercase().replace(' ', "_"));
    if portal.services.iter().any(|s| s.system_name == system_name) {
        return xml(
            StatusCode::UNPROCESSABLE_ENTITY,
            "<errors><error>System name has already been taken</error></errors>".to_string(),
        );
    }
    let service = Service::new(portal.next_id(), input.name, system_name, input.description);
    let response = xml_resource(StatusCode::CREATED, &service);
    portal.services.push(service);
    response
}

async fn read_service(
    State(db): State<Db>,
    Path(service_id): Path<String>,
    Query(auth): Query<Auth>,
) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return xml(StatusCode::FORBIDDEN, "<error>Access denied</error>".to_string());
    }
    let id = parse_id(&service_id, ".xml");
    match portal.services.iter().find(|s| Some(s.id) == id) {
        Some(service) => xml_resource(StatusCode::OK, service),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_service(
    State(db): State<Db>,
    Path(service_id): Path<String>,
    Query(auth): Query<Auth>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return xml(StatusCode::FORBIDDEN, "<error>Access denied</error>".to_string());
    }
    let id = parse_id(&service_id, ".xml");
    let before = portal.services.len();
    portal.services.retain(|s| Some(s.id) != id);
    if portal.services.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::OK.into_response()
}

// --- proxy configurations ---

async fn list_proxy_configs(
    State(db): State<Db>,
    Path((service_id, environment)): Path<(i64, String)>,
    Query(auth): Query<Auth>,
) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let Some(environment) = environment.strip_suffix(".json") else {
        return not_found_json();
    };
    let configs: Vec<Value> = portal
        .proxy_configs
        .iter()
        .filter(|c| c.environment == environment && c.content["id"] == service_id)
        .map(|c| json!({ "proxy_config": c }))
        .collect();
    Json(json!({ "proxy_configs": configs })).into_response()
}

async fn read_proxy_config(
    State(db): State<Db>,
    Path((service_id, environment, version)): Path<(i64, String, String)>,
    Query(auth): Query<Auth>,
) -> Response {
    let portal = db.read().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    let mut configs = portal
        .proxy_configs
        .iter()
        .filter(|c| c.environment == environment && c.content["id"] == service_id);
    let found = if version == "latest.json" {
        configs.max_by_key(|c| c.version)
    } else {
        let version = parse_id(&version, ".json");
        configs.find(|c| Some(c.version) == version)
    };
    match found {
        Some(config) => Json(json!({ "proxy_config": config })).into_response(),
        None => not_found_json(),
    }
}

async fn promote_proxy_config(
    State(db): State<Db>,
    Path((service_id, environment, version)): Path<(i64, String, i64)>,
    Query(auth): Query<Auth>,
    Form(input): Form<Promote>,
) -> Response {
    let mut portal = db.write().await;
    if !authorize(&portal, &auth) {
        return json_error(StatusCode::FORBIDDEN, json!({ "error": FORBIDDEN_MESSAGE }));
    }
    if input.to == environment {
        return json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "errors": { "to": ["must differ from the source environment"] } }),
        );
    }
    let Some(source) = portal
        .proxy_configs
        .iter()
        .find(|c| c.environment == environment && c.version == version && c.content["id"] == service_id)
        .cloned()
    else {
        return not_found_json();
    };
    let promoted = ProxyConfig {
        id: portal.next_id(),
        version: source.version,
        environment: input.to,
        content: source.content,
    };
    portal.proxy_configs.push(promoted.clone());
    (StatusCode::CREATED, Json(json!({ "proxy_config": promoted }))).into_response()
}
