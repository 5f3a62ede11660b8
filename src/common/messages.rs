//! # Message Types
//!
//! Defines the payloads sent to the backend and the shapes it answers with:
//! - Form submissions (contact, service query, quote request, newsletter)
//! - Authentication (credentials, login data, user profile)
//! - The uniform response [`Envelope`]
//!
//! Payloads serialize with camelCase keys. Optional fields that are `None` are
//! omitted from the body, never sent as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::attachment::FileAttachment;

// ============================================================================
// RESPONSE SHAPES
// ============================================================================

/// Uniform wrapper returned by every backend operation except `/health`.
///
/// `success == true` implies `data` is well-formed for the calling operation;
/// `success == false` implies `message` or `errors` is populated for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Answer from `/health`. Not enveloped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    /// Seconds since the backend started
    pub uptime: f64,
}

/// `data` of a successful `/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

/// `data` of a successful `/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: Value,
}

/// Profile returned by `/auth/me`. Fields beyond the common ones are kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ============================================================================
// REQUEST PAYLOADS
// ============================================================================

/// Urgency of a service query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// Urgency of a quote request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuoteUrgency {
    #[default]
    Standard,
    Urgent,
}

/// Calling context of a generic upload, used by the backend for routing and
/// storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UploadKind {
    #[default]
    Contact,
    ServiceQuery,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Contact => "contact",
            UploadKind::ServiceQuery => "service-query",
        }
    }
}

/// The site's main lead-capture form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Free-text description of what the customer wants sourced
    pub requirement: String,
    /// Optional attachment; sent as the multipart `file` part
    #[serde(skip)]
    pub file: Option<FileAttachment>,
}

/// Detailed service inquiry: the contact fields plus service selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQuery {
    #[serde(flatten)]
    pub contact: ContactForm,
    pub service_type: String,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// Contact block nested in a quote request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Structured quote request. Always sent as JSON; attachments are not accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product_name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    pub description: String,
    pub urgency: QuoteUrgency,
    pub contact_info: ContactInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub email: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Flattens a payload into multipart text fields.
///
/// Strings are sent as-is, other scalars in their JSON text form, and `null`
/// values are dropped.
///
/// # Errors
///
/// Fails if the payload does not serialize to a JSON object.
pub fn form_fields<T: Serialize>(payload: &T) -> serde_json::Result<Vec<(String, String)>> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect()),
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "form payload must serialize to an object",
        )),
    }
}
