//! Synchronous client core for the 3scale admin API.
//!
//! # Overview
//! Turns a logical admin operation (verb, path template, parameters,
//! credential) into one HTTP round trip against a tenant's admin portal and
//! decodes the outcome into either a typed resource or a single structured
//! error.
//!
//! # Design
//! - Requests and responses are plain data (`http`); building a request is
//!   pure (`request`) and only a [`Transport`] touches the network.
//! - The wire format (JSON or XML) is a compile-time property of each
//!   [`Resource`]; the decoder never negotiates it.
//! - Non-2xx bodies are normalized into [`ApiErr`] through an ordered chain
//!   of error-body decoders (`decode`).
//! - Transport, remote, decode and local request failures are distinct
//!   [`ClientError`] variants.
//! - No retries, caching or pagination: one call, one round trip.

pub mod client;
pub mod config;
pub mod credential;
pub mod decode;
pub mod error;
pub mod http;
pub mod portal;
pub mod request;
pub mod transport;
pub mod types;

pub use client::ThreeScaleClient;
pub use config::{ClientConfig, ConfigError, TransportConfig};
pub use credential::Credential;
pub use decode::{Resource, WireFormat};
pub use error::{ApiErr, ClientError, DecodeError, ErrorKind, RequestError, TransportError};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use portal::{AdminPortal, Scheme};
pub use request::RequestBuilder;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::{StubTransport, Transport};
pub use types::{
    Application, ApplicationUpdate, Environment, NewService, ProxyConfig, Service,
};
