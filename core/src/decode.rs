//! Response decoding and error normalization.
//!
//! # Design
//! Every resource type declares its wire format at compile time through the
//! [`Resource`] trait; the decoder never sniffs content types on a 2xx.
//!
//! Non-2xx bodies come in several shapes depending on the portal endpoint.
//! They are run through [`ERROR_BODY_DECODERS`] in order; the first decoder
//! that recognizes the body supplies the message. If none does, the raw body
//! text is used, and an empty body yields a generic status-derived message.
//! The rendered `ApiErr` text is the same whichever shape matched.
//!
//! The response is consumed by value. Its body is read to EOF and dropped
//! before any result is returned, so the stream is released on every path.

use std::fmt;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiErr, ClientError, DecodeError, TransportError};
use crate::http::HttpResponse;

/// Encoding of a resource on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Json,
    Xml,
}

impl WireFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            WireFormat::Json => "application/json",
            WireFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Json => f.write_str("JSON"),
            WireFormat::Xml => f.write_str("XML"),
        }
    }
}

/// A decodable admin API resource and the format it travels in.
pub trait Resource: DeserializeOwned {
    const WIRE_FORMAT: WireFormat;
}

/// Attempts to extract a message from an error body. `None` means the shape
/// was not recognized.
pub type ErrorBodyDecoder = fn(&[u8]) -> Option<String>;

/// Error body decoders, tried in order.
pub const ERROR_BODY_DECODERS: &[ErrorBodyDecoder] = &[
    decode_single_error,
    decode_field_errors,
    decode_error_list,
    decode_xml_errors,
];

/// Decode a response into `T`, or into the error it reports.
pub fn decode<T: Resource>(response: HttpResponse) -> Result<T, ClientError> {
    let success = response.is_success();
    let (status, body) = read_body(response)?;
    if !success {
        return Err(api_error(status, &body).into());
    }
    decode_body::<T>(status, &body).map_err(ClientError::from)
}

/// Check a response whose body carries nothing of interest, e.g. a delete.
pub fn decode_empty(response: HttpResponse) -> Result<(), ClientError> {
    let success = response.is_success();
    let (status, body) = read_body(response)?;
    if !success {
        return Err(api_error(status, &body).into());
    }
    Ok(())
}

/// Build the normalized error for a non-2xx `status` and its raw `body`.
pub fn api_error(status: u16, body: &[u8]) -> ApiErr {
    let message = ERROR_BODY_DECODERS
        .iter()
        .find_map(|decoder| decoder(body))
        .unwrap_or_else(|| fallback_message(status, body));
    tracing::warn!(status, reason = %message, "admin API returned an error");
    ApiErr::new(status, message)
}

fn read_body(response: HttpResponse) -> Result<(u16, Vec<u8>), TransportError> {
    let HttpResponse {
        status, mut body, ..
    } = response;
    let bytes = body.read_all().map_err(|e| {
        TransportError::with_source(format!("failed to read response body (status {status})"), e)
    })?;
    Ok((status, bytes))
}

fn decode_body<T: Resource>(status: u16, body: &[u8]) -> Result<T, DecodeError> {
    let format = T::WIRE_FORMAT;
    let decode_error = |reason: String| DecodeError {
        format,
        status,
        reason,
    };
    match format {
        WireFormat::Json => serde_json::from_slice(body).map_err(|e| decode_error(e.to_string())),
        WireFormat::Xml => {
            let text = std::str::from_utf8(body).map_err(|e| decode_error(e.to_string()))?;
            quick_xml::de::from_str(text).map_err(|e| decode_error(e.to_string()))
        }
    }
}

fn non_empty(message: &str) -> Option<String> {
    let trimmed = message.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `{"error": "<message>"}`
fn decode_single_error(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct SingleError {
        error: String,
    }

    let parsed: SingleError = serde_json::from_slice(body).ok()?;
    non_empty(&parsed.error)
}

/// `{"errors": {"<field>": ["<message>", ...]}}`, flattened in body order.
/// Messages under `base` apply to the whole record and carry no field prefix.
fn decode_field_errors(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct FieldErrors {
        errors: serde_json::Map<String, serde_json::Value>,
    }

    let parsed: FieldErrors = serde_json::from_slice(body).ok()?;
    let mut parts = Vec::new();
    for (field, messages) in &parsed.errors {
        let messages: Vec<&str> = match messages {
            serde_json::Value::Array(items) => items.iter().filter_map(|m| m.as_str()).collect(),
            serde_json::Value::String(message) => vec![message.as_str()],
            _ => continue,
        };
        for message in messages {
            if field == "base" {
                parts.push(message.to_string());
            } else {
                parts.push(format!("{field} {message}"));
            }
        }
    }
    non_empty(&parts.join("; "))
}

/// `{"errors": ["<message>", ...]}`
fn decode_error_list(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorList {
        errors: Vec<String>,
    }

    let parsed: ErrorList = serde_json::from_slice(body).ok()?;
    non_empty(&parsed.errors.join("; "))
}

/// Name of the first element in `text`, skipping the declaration, comments
/// and doctype.
fn xml_root_name(text: &str) -> Option<Vec<u8>> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Some(element.name().as_ref().to_vec())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// `<error>msg</error>` or `<errors><error>m1</error>...</errors>`. Any other
/// root element, e.g. an HTML page from a proxy in front of the portal, is
/// left to the raw-body fallback.
fn decode_xml_errors(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct XmlErrors {
        #[serde(rename = "error", default)]
        errors: Vec<String>,
        #[serde(rename = "$text", default)]
        text: Option<String>,
    }

    let text = std::str::from_utf8(body).ok()?.trim();
    if !text.starts_with('<') {
        return None;
    }
    if !matches!(xml_root_name(text).as_deref(), Some(b"error" | b"errors")) {
        return None;
    }
    let parsed: XmlErrors = quick_xml::de::from_str(text).ok()?;
    if parsed.errors.is_empty() {
        return parsed.text.as_deref().and_then(non_empty);
    }
    non_empty(&parsed.errors.join("; "))
}

fn fallback_message(status: u16, body: &[u8]) -> String {
    if let Some(raw) = non_empty(&String::from_utf8_lossy(body)) {
        return raw;
    }
    match ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("{reason} (no additional detail)"),
        None => format!("HTTP {status} (no additional detail)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        id: u64,
        name: String,
    }

    impl Resource for Widget {
        const WIRE_FORMAT: WireFormat = WireFormat::Json;
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct XmlWidget {
        id: u64,
        name: String,
    }

    impl Resource for XmlWidget {
        const WIRE_FORMAT: WireFormat = WireFormat::Xml;
    }

    #[test]
    fn decodes_json_success() {
        let widget: Widget = decode(HttpResponse::new(200, r#"{"id":7,"name":"w"}"#)).unwrap();
        assert_eq!(widget, Widget { id: 7, name: "w".to_string() });
    }

    #[test]
    fn decodes_xml_success() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?><widget><id>7</id><name>w</name></widget>"#;
        let widget: XmlWidget = decode(HttpResponse::new(201, body)).unwrap();
        assert_eq!(widget, XmlWidget { id: 7, name: "w".to_string() });
    }

    #[test]
    fn xml_resource_does_not_accept_json() {
        let err = decode::<XmlWidget>(HttpResponse::new(200, r#"{"id":7,"name":"w"}"#)).unwrap_err();
        match err {
            ClientError::Decode(e) => {
                assert_eq!(e.format, WireFormat::Xml);
                assert_eq!(e.status, 200);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn bad_json_on_success_is_decode_error() {
        let err = decode::<Widget>(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ClientError::Decode(DecodeError { format: WireFormat::Json, .. })));
    }

    #[test]
    fn single_error_shape() {
        let err = api_error(403, br#"{ "error": "Your access token does not have the correct permissions" }"#);
        assert_eq!(err.code(), 403);
        assert_eq!(err.message(), "Your access token does not have the correct permissions");
    }

    #[test]
    fn field_errors_are_flattened_in_order() {
        let body = br#"{"errors":{"system_name":["has already been taken","is invalid"],"name":["can't be blank"]}}"#;
        let err = api_error(422, body);
        assert_eq!(
            err.message(),
            "system_name has already been taken; system_name is invalid; name can't be blank"
        );
    }

    #[test]
    fn base_errors_have_no_field_prefix() {
        let err = api_error(422, br#"{"errors":{"base":["Plan is not published"]}}"#);
        assert_eq!(err.message(), "Plan is not published");
    }

    #[test]
    fn error_list_shape() {
        let err = api_error(400, br#"{"errors":["first","second"]}"#);
        assert_eq!(err.message(), "first; second");
    }

    #[test]
    fn xml_error_shapes() {
        let err = api_error(403, br#"<?xml version="1.0" encoding="UTF-8"?><error>Access denied</error>"#);
        assert_eq!(err.message(), "Access denied");

        let err = api_error(422, b"<errors><error>Name can't be blank</error><error>System name is invalid</error></errors>");
        assert_eq!(err.message(), "Name can't be blank; System name is invalid");
    }

    #[test]
    fn xml_with_other_root_falls_back_to_raw_body() {
        let err = api_error(500, b"<html>Maintenance</html>");
        assert_eq!(err.message(), "<html>Maintenance</html>");

        let body = b"<!DOCTYPE html>\n<html><body><h1>503 Service Unavailable</h1></body></html>";
        let err = api_error(503, body);
        assert_eq!(err.message(), String::from_utf8_lossy(body));
    }

    #[test]
    fn xml_root_is_found_after_declaration_and_comments() {
        let text = r#"<?xml version="1.0"?><!-- note --><errors><error>a</error></errors>"#;
        assert_eq!(xml_root_name(text).as_deref(), Some(&b"errors"[..]));
        assert_eq!(xml_root_name("no markup here"), None);
    }

    #[test]
    fn plain_text_falls_back_to_raw_body() {
        let err = api_error(502, b"  Bad gateway from upstream\n");
        assert_eq!(err.message(), "Bad gateway from upstream");
        assert_eq!(err.code(), 502);
    }

    #[test]
    fn unrecognized_json_falls_back_to_raw_body() {
        let err = api_error(400, br#"{"status":"Test Error"}"#);
        assert_eq!(err.message(), r#"{"status":"Test Error"}"#);
    }

    #[test]
    fn empty_body_gets_status_derived_message() {
        let err = api_error(404, b"");
        assert_eq!(err.message(), "Not Found (no additional detail)");
        let err = api_error(599, b"   ");
        assert_eq!(err.message(), "HTTP 599 (no additional detail)");
        assert_eq!(err.code(), 599);
    }

    #[test]
    fn empty_error_string_is_not_a_match() {
        let err = api_error(500, br#"{"error":""}"#);
        assert_eq!(err.message(), r#"{"error":""}"#);
    }

    #[test]
    fn decode_empty_accepts_any_2xx_body() {
        decode_empty(HttpResponse::new(200, "")).unwrap();
        decode_empty(HttpResponse::new(204, "ignored")).unwrap();
        let err = decode_empty(HttpResponse::new(403, r#"{"error":"denied"}"#)).unwrap_err();
        assert_eq!(err.status_code(), Some(403));
    }
}
