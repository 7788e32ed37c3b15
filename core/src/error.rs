//! Error types for the admin portal client.
//!
//! # Design
//! Four failure kinds stay distinguishable all the way to the caller:
//! - `Transport`: the round trip itself failed (connect, timeout, body read).
//! - `Api`: the portal answered with a non-2xx status. The message is
//!   normalized from whatever error body shape the portal sent.
//! - `Decode`: a 2xx body did not match the resource's schema. This is a
//!   client/server contract mismatch, not a business error.
//! - `Request`: the request could not be built locally.
//!
//! `ClientError` renders each variant transparently, so `to_string()` on an
//! API failure yields the exact `ApiErr` text.

use thiserror::Error;

use crate::decode::WireFormat;

/// Normalized error reported by the remote admin portal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error calling 3scale system - reason: {{ \"error\": \"{message}\" }} - code: {http_status_code}")]
pub struct ApiErr {
    http_status_code: u16,
    message: String,
}

impl ApiErr {
    pub(crate) fn new(http_status_code: u16, message: impl Into<String>) -> Self {
        Self {
            http_status_code,
            message: message.into(),
        }
    }

    /// The HTTP status the portal answered with.
    pub fn code(&self) -> u16 {
        self.http_status_code
    }

    /// The normalized reason, without the rendering envelope.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Network-level failure raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// A 2xx response whose body does not match the expected resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode {format} response body (status {status}): {reason}")]
pub struct DecodeError {
    pub format: WireFormat,
    pub status: u16,
    pub reason: String,
}

/// Local failure while building a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid admin portal '{url}': {reason}")]
    InvalidPortal { url: String, reason: String },

    #[error("form encoding failed: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    #[error("JSON encoding failed: {0}")]
    JsonEncode(#[from] serde_json::Error),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Api,
    Decode,
    Request,
}

/// Every error a client call can return.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiErr),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Api(_) => ErrorKind::Api,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Request(_) => ErrorKind::Request,
        }
    }

    pub fn as_api_err(&self) -> Option<&ApiErr> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Remote status code, when the portal reported the failure.
    pub fn status_code(&self) -> Option<u16> {
        self.as_api_err().map(ApiErr::code)
    }
}
