//! # Error Taxonomy
//!
//! Every failed backend call ends up as an [`ApiError`] carrying one
//! [`ErrorKind`] and the message shown to the user. The mapping from a raw
//! failure to a kind lives in [`crate::client::classify`].

use std::fmt;
use thiserror::Error;

/// Closed set of failure classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 401. Clears the persisted session token.
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 5xx
    ServerError,
    /// Any other 4xx, or an envelope with `success: false`
    ApplicationError,
    /// No response was received (timeout, connection refused, DNS, offline)
    NetworkError,
    /// Anything not covered above
    UnknownError,
}

impl ErrorKind {
    /// Fixed user-facing message for kinds that do not carry server text.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Authentication required",
            ErrorKind::Forbidden => "Access denied",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::ServerError => "Server error, try again later",
            ErrorKind::ApplicationError => "An error occurred",
            ErrorKind::NetworkError => "Network error, check your connection",
            ErrorKind::UnknownError => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::ApplicationError => "ApplicationError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::UnknownError => "UnknownError",
        };
        f.write_str(name)
    }
}

/// A classified failure of a single backend call.
///
/// `message` is what the user sees. `detail` keeps the underlying cause
/// (status line, transport error, decode error) for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub errors: Vec<String>,
    pub detail: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            errors: Vec::new(),
            detail: String::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}
