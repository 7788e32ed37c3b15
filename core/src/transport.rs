//! The network boundary.
//!
//! # Design
//! [`Transport`] is the only place a request leaves the process. It has one
//! method and the client holds it as `Arc<dyn Transport>`, so production code
//! and tests differ only in which implementation is injected:
//! - [`UreqTransport`] performs a blocking round trip with a `ureq` agent.
//!   Non-2xx statuses come back as data; only connection-level failures
//!   become a [`TransportError`]. The body is handed over unread, as a
//!   stream, so its size is not capped here.
//! - [`StubTransport`] answers from canned routes keyed by method and path and
//!   records every request it sees.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use super::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
    use crate::config::TransportConfig;
    use crate::http::ResponseBody;

    /// Blocking transport backed by a pooled `ureq` agent.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::with_config(&TransportConfig::default())
        }

        pub fn with_config(config: &TransportConfig) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(config.timeout)
                .user_agent(config.user_agent.clone())
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let headers = &request.headers;
            let body = request.body.as_deref();

            let result = match request.method {
                HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
                HttpMethod::Post => send(with_headers(self.agent.post(url), headers), body),
                HttpMethod::Put => send(with_headers(self.agent.put(url), headers), body),
            };
            let response = result.map_err(|e| {
                TransportError::with_source(format!("{} {} failed", request.method, request.path()), e)
            })?;

            let (parts, body) = response.into_parts();
            let headers = parts
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            // Resources such as proxy config lists can exceed ureq's default
            // read limit; the decoder reads the stream to EOF itself.
            let reader = body.into_with_config().limit(u64::MAX).reader();

            Ok(HttpResponse {
                status: parts.status.as_u16(),
                headers,
                body: ResponseBody::from_reader(reader),
            })
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn send(
        builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
        body: Option<&[u8]>,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        match body {
            Some(bytes) => builder.send(bytes),
            None => builder.send_empty(),
        }
    }
}

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Deterministic in-memory transport for tests.
///
/// Routes match on method and URL path; the query string is ignored so the
/// credential does not have to be part of the key. Unknown routes fail with a
/// [`TransportError`], which also makes the stub usable for exercising
/// transport failure handling.
#[derive(Default)]
pub struct StubTransport {
    routes: HashMap<(HttpMethod, String), Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `status` and a copy of `body` on every call.
    pub fn route(
        self,
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        let body = body.into();
        self.route_with(method, path, move |_| HttpResponse::new(status, body.clone()))
    }

    /// Answer `method path` with whatever `handler` builds from the request.
    pub fn route_with<F>(mut self, method: HttpMethod, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes.insert((method, path.into()), Box::new(handler));
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method, request.path().to_string());
        let response = self.routes.get(&key).map(|handler| handler(&request));
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        response.ok_or_else(|| TransportError::new(format!("no stub route for {} {}", key.0, key.1)))
    }
}
