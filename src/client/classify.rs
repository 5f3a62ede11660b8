//! # Failure Classification
//!
//! Pure mapping from a raw [`Failure`] to an [`ApiError`]. No notification and
//! no session side effects happen here; those are middleware concerns.
//!
//! | Failure                               | Kind             |
//! |---------------------------------------|------------------|
//! | status 401                            | Unauthorized     |
//! | status 403                            | Forbidden        |
//! | status 404                            | NotFound         |
//! | status 5xx                            | ServerError      |
//! | other 4xx                             | ApplicationError |
//! | envelope with `success: false`        | ApplicationError |
//! | timeout / no response                 | NetworkError     |
//! | anything else                         | UnknownError     |

use serde_json::Value;

use super::transport::TransportError;
use crate::common::errors::{ApiError, ErrorKind};

/// What went wrong with a call, before classification.
#[derive(Debug, Clone)]
pub enum Failure {
    /// A response arrived with a non-2xx status.
    Status { status: u16, body: Vec<u8> },
    /// A 2xx response whose envelope reported `success: false`.
    Rejected {
        status: u16,
        message: Option<String>,
        errors: Vec<String>,
    },
    /// No response arrived.
    Transport(TransportError),
    /// A 2xx response whose body did not have the expected shape.
    Decode(String),
}

/// Classifies a failure and picks the message the user will see.
pub fn classify(failure: &Failure) -> ApiError {
    match failure {
        Failure::Status { status, body } => classify_status(*status, body),
        Failure::Rejected {
            status,
            message,
            errors,
        } => {
            let text = server_text(message.as_deref(), errors)
                .unwrap_or(ErrorKind::ApplicationError.default_message());
            ApiError::new(ErrorKind::ApplicationError, text)
                .with_status(*status)
                .with_errors(errors.clone())
                .with_detail("envelope reported success: false")
        }
        Failure::Transport(err) => {
            let kind = match err {
                TransportError::Timeout | TransportError::NoResponse(_) => ErrorKind::NetworkError,
                TransportError::InvalidRequest(_) => ErrorKind::UnknownError,
            };
            ApiError::new(kind, kind.default_message()).with_detail(err.to_string())
        }
        Failure::Decode(reason) => ApiError::new(
            ErrorKind::UnknownError,
            ErrorKind::UnknownError.default_message(),
        )
        .with_detail(format!("unexpected response body: {}", reason)),
    }
}

fn classify_status(status: u16, body: &[u8]) -> ApiError {
    let kind = match status {
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        400..=499 => ErrorKind::ApplicationError,
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::UnknownError,
    };

    let parsed = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
    // Non-string entries are dropped; they do not invalidate `message`.
    let errors: Vec<String> = parsed
        .get("errors")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // Only application errors surface the server's own text.
    let message = if kind == ErrorKind::ApplicationError {
        let server_message = parsed.get("message").and_then(Value::as_str);
        server_text(server_message, &errors)
            .unwrap_or(kind.default_message())
            .to_string()
    } else {
        kind.default_message().to_string()
    };

    ApiError::new(kind, message)
        .with_status(status)
        .with_errors(errors)
        .with_detail(format!("HTTP {}", status))
}

/// The server's display text: a non-blank `message`, else the first error.
fn server_text<'a>(message: Option<&'a str>, errors: &'a [String]) -> Option<&'a str> {
    message
        .filter(|m| !m.trim().is_empty())
        .or_else(|| errors.first().map(String::as_str))
}
