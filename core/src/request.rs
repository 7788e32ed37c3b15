//! Request construction.
//!
//! # Design
//! A [`RequestBuilder`] collects the logical parts of an admin API call: verb,
//! path template, parameters and payload. [`RequestBuilder::build`] resolves
//! them against an [`AdminPortal`] and attaches the [`Credential`]. Building
//! is pure; nothing is sent.
//!
//! Path templates use `{name}` placeholders, e.g.
//! `/admin/api/accounts/{account_id}/applications.json`. Values are
//! percent-encoded as path segment content.

use serde::Serialize;

use crate::credential::Credential;
use crate::decode::WireFormat;
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest};
use crate::portal::AdminPortal;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
struct EncodedBody {
    content_type: &'static str,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: HttpMethod,
    template: &'static str,
    path_params: Vec<(&'static str, String)>,
    query: Vec<(String, String)>,
    accept: Option<WireFormat>,
    body: Option<EncodedBody>,
}

impl RequestBuilder {
    pub fn new(method: HttpMethod, template: &'static str) -> Self {
        Self {
            method,
            template,
            path_params: Vec::new(),
            query: Vec::new(),
            accept: None,
            body: None,
        }
    }

    pub fn get(template: &'static str) -> Self {
        Self::new(HttpMethod::Get, template)
    }

    pub fn post(template: &'static str) -> Self {
        Self::new(HttpMethod::Post, template)
    }

    pub fn put(template: &'static str) -> Self {
        Self::new(HttpMethod::Put, template)
    }

    pub fn delete(template: &'static str) -> Self {
        Self::new(HttpMethod::Delete, template)
    }

    /// Bind the `{name}` placeholder.
    pub fn path_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.path_params.push((name, value.to_string()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Ask the portal for the given representation.
    pub fn accept(mut self, format: WireFormat) -> Self {
        self.accept = Some(format);
        self
    }

    /// Encode `params` as an `application/x-www-form-urlencoded` body.
    pub fn form<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, RequestError> {
        let encoded = serde_urlencoded::to_string(params)?;
        self.body = Some(EncodedBody {
            content_type: FORM_CONTENT_TYPE,
            bytes: encoded.into_bytes(),
        });
        Ok(self)
    }

    /// Encode `payload` as a JSON body.
    pub fn json<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self, RequestError> {
        let bytes = serde_json::to_vec(payload)?;
        self.body = Some(EncodedBody {
            content_type: JSON_CONTENT_TYPE,
            bytes,
        });
        Ok(self)
    }

    /// Resolve the request against `portal` and attach `credential`.
    ///
    /// The credential is always the last query parameter.
    ///
    /// # Panics
    ///
    /// Panics if a placeholder in the template has no bound value, if a bound
    /// value is empty, or if the template has an unterminated `{`. These are
    /// programming errors in the calling resource method.
    pub fn build(
        self,
        portal: &AdminPortal,
        credential: &Credential,
    ) -> Result<HttpRequest, RequestError> {
        let mut url = portal.base_url().clone();
        let segments: Vec<String> = self
            .template
            .trim_start_matches('/')
            .split('/')
            .map(|segment| self.expand_segment(segment))
            .collect();

        url.path_segments_mut()
            .map_err(|()| RequestError::InvalidPortal {
                url: portal.to_string(),
                reason: "admin portal URL cannot be a base".to_string(),
            })?
            .clear()
            .extend(&segments);

        url.query_pairs_mut()
            .extend_pairs(&self.query)
            .append_pair(credential.param_name(), credential.secret());

        let mut headers = Vec::new();
        if let Some(format) = self.accept {
            headers.push(("Accept".to_string(), format.media_type().to_string()));
        }
        let body = self.body.map(|body| {
            headers.push(("Content-Type".to_string(), body.content_type.to_string()));
            body.bytes
        });

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }

    fn expand_segment(&self, segment: &str) -> String {
        let mut out = String::with_capacity(segment.len());
        let mut rest = segment;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                panic!("unterminated placeholder in path template '{}'", self.template);
            };
            out.push_str(self.param_value(&after[..end]));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }

    fn param_value(&self, name: &str) -> &str {
        let value = self
            .path_params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_else(|| {
                panic!("path parameter '{name}' is not bound for '{}'", self.template)
            });
        assert!(
            !value.trim().is_empty(),
            "path parameter '{name}' must not be empty for '{}'",
            self.template
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    fn portal() -> AdminPortal {
        AdminPortal::parse("https://acme-admin.3scale.net").unwrap()
    }

    fn token() -> Credential {
        Credential::access_token("someAccessToken")
    }

    #[test]
    fn build_substitutes_path_params_and_appends_credential() {
        let req = RequestBuilder::get("/admin/api/accounts/{account_id}/applications/{application_id}.json")
            .path_param("account_id", 321)
            .path_param("application_id", 157)
            .build(&portal(), &token())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url.as_str(),
            "https://acme-admin.3scale.net/admin/api/accounts/321/applications/157.json?access_token=someAccessToken"
        );
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn credential_is_last_query_param() {
        let req = RequestBuilder::get("/admin/api/services.xml")
            .query("page", 2)
            .query("per_page", 50)
            .build(&portal(), &Credential::provider_key("pk"))
            .unwrap();
        assert_eq!(req.url.query(), Some("page=2&per_page=50&provider_key=pk"));
    }

    #[test]
    fn path_param_values_are_percent_encoded() {
        let req = RequestBuilder::get("/admin/api/services/{service_id}/proxy/configs/{environment}/latest.json")
            .path_param("service_id", "a/b c")
            .path_param("environment", "sandbox")
            .build(&portal(), &token())
            .unwrap();
        assert_eq!(
            req.path(),
            "/admin/api/services/a%2Fb%20c/proxy/configs/sandbox/latest.json"
        );
    }

    #[test]
    fn form_body_sets_content_type() {
        #[derive(Serialize)]
        struct Params<'a> {
            plan_id: &'a str,
            name: &'a str,
            description: &'a str,
        }

        let req = RequestBuilder::post("/admin/api/accounts/{account_id}/applications.json")
            .path_param("account_id", "321")
            .accept(WireFormat::Json)
            .form(&Params {
                plan_id: "abc",
                name: "test",
                description: "my app & more",
            })
            .unwrap()
            .build(&portal(), &token())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(
            String::from_utf8(req.body.unwrap()).unwrap(),
            "plan_id=abc&name=test&description=my+app+%26+more"
        );
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = RequestBuilder::put("/admin/api/services/{service_id}.xml")
            .path_param("service_id", 18)
            .json(&serde_json::json!({"name": "Echo API"}))
            .unwrap()
            .build(&portal(), &token())
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Echo API");
    }

    #[test]
    #[should_panic(expected = "path parameter 'account_id' must not be empty")]
    fn empty_path_param_panics() {
        let _ = RequestBuilder::get("/admin/api/accounts/{account_id}/applications.json")
            .path_param("account_id", "")
            .build(&portal(), &token());
    }

    #[test]
    #[should_panic(expected = "path parameter 'application_id' is not bound")]
    fn missing_path_param_panics() {
        let _ = RequestBuilder::delete("/admin/api/accounts/{account_id}/applications/{application_id}.json")
            .path_param("account_id", 1)
            .build(&portal(), &token());
    }
}
