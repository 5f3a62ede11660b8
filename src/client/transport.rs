//! # HTTP Transport
//!
//! The wire layer underneath [`ApiClient`](super::client::ApiClient).
//!
//! A [`Transport`] takes a fully prepared [`ApiRequest`] and returns the raw
//! [`ApiResponse`], whatever its status. It never classifies failures and never
//! touches the session: that is the job of the middleware chain. A transport
//! error means no response was received at all.
//!
//! ## Bodies
//!
//! ```text
//! RequestBody::Empty       -> no body
//! RequestBody::Json(v)     -> Content-Type: application/json
//! RequestBody::Multipart   -> Content-Type: multipart/form-data; boundary=...
//! ```
//!
//! [`ReqwestTransport`] is the production implementation. Tests plug in their
//! own `Transport` to run the middleware chain without a network.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::common::attachment::FileAttachment;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// The part named `name`, if this is a multipart body.
    pub fn part(&self, name: &str) -> Option<&FormPart> {
        match self {
            RequestBody::Multipart(parts) => parts.iter().find(|p| p.name == name),
            _ => None,
        }
    }
}

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File(FileAttachment),
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: FileAttachment) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(file),
        }
    }
}

/// An outgoing call, relative to the configured base URL.
///
/// Request middleware may add or replace headers before the request is sent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Correlates trace lines of a single call
    pub id: Uuid,
    pub method: Method,
    /// Path below the base URL, e.g. `/contact`
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_parts(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Sets a header, replacing any existing value (names compare
    /// case-insensitively).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    /// Connection refused, DNS failure, reset, TLS failure, offline...
    #[error("no response received: {0}")]
    NoResponse(String),
    /// The request could not be built (bad URL, bad header, bad MIME type).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Sends prepared requests and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to the absolute `url`.
    ///
    /// Any HTTP status is an `Ok` response; only the absence of a response is
    /// an error.
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// A [`reqwest`]-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, TransportError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.inner.request(request.method.clone(), url);

        let multipart = request.body.is_multipart();
        for (name, value) in &request.headers {
            // reqwest sets the multipart content type itself, boundary included.
            if multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let resp = builder.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(ApiResponse { status, body })
    }
}

fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match &part.value {
            PartValue::Text(text) => form.text(part.name.clone(), text.clone()),
            PartValue::File(file) => {
                let blob = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                form.part(part.name.clone(), blob)
            }
        };
    }
    Ok(form)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::NoResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = ApiRequest::get("/auth/me");
        request.set_header("authorization", "Bearer old");
        request.set_header("Authorization", "Bearer new");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_request_body_part_lookup() {
        let file = FileAttachment::new("a.pdf", "application/pdf", b"%PDF".to_vec());
        let request = ApiRequest::post("/upload").with_parts(vec![
            FormPart::file("file", file.clone()),
            FormPart::text("type", "contact"),
        ]);

        assert!(request.body.is_multipart());
        assert_eq!(request.body.part("file").map(|p| &p.value), Some(&PartValue::File(file)));
        assert!(request.body.part("missing").is_none());

        let json = ApiRequest::post("/newsletter/subscribe").with_json(json!({"email": "a@b.co"}));
        assert!(!json.body.is_multipart());
        assert!(json.body.part("email").is_none());
    }

    #[test]
    fn test_response_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(304, "").is_success());
        assert!(!ApiResponse::new(401, "").is_success());
    }

    #[test]
    fn test_build_form_rejects_bad_mime() {
        let file = FileAttachment::new("a.bin", "not a mime type", vec![1, 2, 3]);
        let result = build_form(&[FormPart::file("file", file)]);
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }
}
