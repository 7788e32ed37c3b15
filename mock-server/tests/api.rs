use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, DEVELOPER_ACCOUNT_ID, ECHO_SERVICE_ID};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "secret-token";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn applications_uri() -> String {
    format!("/admin/api/accounts/{DEVELOPER_ACCOUNT_ID}/applications.json?access_token={TOKEN}")
}

// --- auth ---

#[tokio::test]
async fn wrong_token_is_forbidden_with_error_body() {
    let resp = app(TOKEN)
        .oneshot(get(&format!(
            "/admin/api/accounts/{DEVELOPER_ACCOUNT_ID}/applications.json?access_token=nope"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Your access token does not have the correct permissions");
}

#[tokio::test]
async fn xml_endpoints_answer_forbidden_in_xml() {
    let resp = app(TOKEN)
        .oneshot(get("/admin/api/services.xml"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_text(resp).await.ends_with("<error>Access denied</error>"));
}

// --- applications ---

#[tokio::test]
async fn list_applications_empty() {
    let resp = app(TOKEN).oneshot(get(&applications_uri())).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["applications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let resp = app(TOKEN)
        .oneshot(get(&format!("/admin/api/accounts/999/applications.json?access_token={TOKEN}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["status"], "Not found");
}

#[tokio::test]
async fn create_application_returns_201() {
    let resp = app(TOKEN)
        .oneshot(form_request("POST", &applications_uri(), "plan_id=10&name=app&description=hello+world"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["application"]["name"], "app");
    assert_eq!(body["application"]["description"], "hello world");
    assert_eq!(body["application"]["account_id"], DEVELOPER_ACCOUNT_ID);
}

#[tokio::test]
async fn create_application_blank_name_returns_422() {
    let resp = app(TOKEN)
        .oneshot(form_request("POST", &applications_uri(), "plan_id=10&name="))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["errors"]["name"][0], "can't be blank");
}

#[tokio::test]
async fn create_application_unknown_plan_returns_404() {
    let resp = app(TOKEN)
        .oneshot(form_request("POST", &applications_uri(), "plan_id=abc&name=x"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_application_not_found() {
    let resp = app(TOKEN)
        .oneshot(get(&format!(
            "/admin/api/accounts/{DEVELOPER_ACCOUNT_ID}/applications/1.json?access_token={TOKEN}"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- services ---

#[tokio::test]
async fn list_services_returns_seeded_service_as_xml() {
    let resp = app(TOKEN)
        .oneshot(get(&format!("/admin/api/services.xml?access_token={TOKEN}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/xml; charset=utf-8"
    );
    let body = body_text(resp).await;
    assert!(body.contains(&format!("<id>{ECHO_SERVICE_ID}</id>")));
    assert!(body.contains("<system_name>echo-api</system_name>"));
}

#[tokio::test]
async fn create_service_duplicate_system_name_returns_422() {
    let resp = app(TOKEN)
        .oneshot(form_request(
            "POST",
            &format!("/admin/api/services.xml?access_token={TOKEN}"),
            "name=Echo&system_name=echo-api",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("<errors><error>System name has already been taken</error></errors>"));
}

// --- proxy configs ---

#[tokio::test]
async fn latest_sandbox_config_is_seeded() {
    let resp = app(TOKEN)
        .oneshot(get(&format!(
            "/admin/api/services/{ECHO_SERVICE_ID}/proxy/configs/sandbox/latest.json?access_token={TOKEN}"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["proxy_config"]["version"], 1);
    assert_eq!(body["proxy_config"]["environment"], "sandbox");
    assert_eq!(body["proxy_config"]["content"]["proxy"]["service_id"], ECHO_SERVICE_ID);
}

#[tokio::test]
async fn production_has_no_config_until_promoted() {
    let resp = app(TOKEN)
        .oneshot(get(&format!(
            "/admin/api/services/{ECHO_SERVICE_ID}/proxy/configs/production/latest.json?access_token={TOKEN}"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn promote_to_same_environment_returns_422() {
    let resp = app(TOKEN)
        .oneshot(form_request(
            "POST",
            &format!(
                "/admin/api/services/{ECHO_SERVICE_ID}/proxy/configs/sandbox/1/promote.json?access_token={TOKEN}"
            ),
            "to=sandbox",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
