//! # Submission Service
//!
//! One operation per business action, built on the
//! [`ApiClient`](crate::client::ApiClient).
//!
//! ## Responsibilities
//!
//! - **Validation**: contact-style forms and attachments are checked before
//!   dispatch; an invalid form never reaches the network
//! - **Payload shaping**: JSON for plain payloads, multipart whenever a file is
//!   attached
//! - **Success notices**: each successful submission shows its own message
//! - **Failure propagation**: failures come back as [`SubmissionError`] with
//!   the original classification intact. They are not notified again here;
//!   the client's middleware already did that once.
//!
//! ## Session
//!
//! Only [`login`](SubmissionService::login) and
//! [`logout`](SubmissionService::logout) write the session store (the 401
//! handling in the middleware also clears it). `logout` clears the local token
//! whether or not the backend call succeeds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let service = SubmissionService::from_config(&config, session, Arc::new(LogNotifier))?;
//!
//! match service.submit_contact_form(&form).await {
//!     Ok(envelope) => reset_form(),
//!     Err(e) => keep_values_and_reenable_submit(e.user_message()),
//! }
//! ```

use log::{debug, error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::validation::{Validate, ValidationErrors};
use crate::client::notify::{Notice, Notifier};
use crate::client::session::{SessionError, SessionStore};
use crate::client::transport::{ApiRequest, FormPart, TransportError};
use crate::client::ApiClient;
use crate::common::attachment::FileAttachment;
use crate::common::config::ApiConfig;
use crate::common::errors::{ApiError, ErrorKind};
use crate::common::messages::{
    form_fields, ContactForm, Credentials, Envelope, HealthCheckResponse, LoginData,
    NewsletterSubscription, QuoteRequest, ServiceQuery, UploadKind, UploadedFile, UserProfile,
};

pub const CONTACT_SUCCESS: &str = "Message sent successfully! We will contact you soon.";
pub const SERVICE_QUERY_SUCCESS: &str =
    "Service query submitted! Our team will review and contact you.";
pub const QUOTE_SUCCESS: &str = "Quote request submitted! We will send you a detailed quote soon.";
pub const NEWSLETTER_SUCCESS: &str = "Successfully subscribed to our newsletter!";
pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const LOGOUT_SUCCESS: &str = "Logged out successfully!";

/// The business action a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    HealthCheck,
    ContactForm,
    ServiceQuery,
    QuoteRequest,
    Newsletter,
    Upload,
    Login,
    Logout,
    CurrentUser,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::HealthCheck => "health check",
            Operation::ContactForm => "contact form submission",
            Operation::ServiceQuery => "service query submission",
            Operation::QuoteRequest => "quote request submission",
            Operation::Newsletter => "newsletter subscription",
            Operation::Upload => "file upload",
            Operation::Login => "login",
            Operation::Logout => "logout",
            Operation::CurrentUser => "user info lookup",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The backend call failed; `source` carries the classification.
    #[error("{operation} failed: {source}")]
    Api {
        operation: Operation,
        #[source]
        source: ApiError,
    },
    /// Client-side validation rejected the input. Nothing was sent.
    #[error("{operation} rejected: {errors}")]
    Invalid {
        operation: Operation,
        errors: ValidationErrors,
    },
    #[error("could not encode {operation} payload: {source}")]
    Encode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
    #[error("session store error: {0}")]
    Session(#[from] SessionError),
}

impl SubmissionError {
    fn api(operation: Operation) -> impl FnOnce(ApiError) -> Self {
        move |source| SubmissionError::Api { operation, source }
    }

    /// Classification of a backend failure, `None` for local failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SubmissionError::Api { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    /// The message to show the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Api { source, .. } => source.message.clone(),
            SubmissionError::Invalid { errors, .. } => errors
                .errors()
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Please check the form".to_string()),
            SubmissionError::Encode { .. } | SubmissionError::Session(_) => {
                ErrorKind::UnknownError.default_message().to_string()
            }
        }
    }
}

/// Typed business operations against the backend.
#[derive(Clone)]
pub struct SubmissionService {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionService {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Builds the production client and wraps it.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn from_config(
        config: &ApiConfig,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, TransportError> {
        let client = ApiClient::from_config(config, session, notifier.clone())?;
        Ok(Self::new(client, notifier))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Checks connectivity via `/health`.
    pub async fn health_check(&self) -> Result<HealthCheckResponse, SubmissionError> {
        self.client
            .fetch(ApiRequest::get("/health"))
            .await
            .map_err(SubmissionError::api(Operation::HealthCheck))
    }

    /// Submits the contact form. Multipart when a file is attached, JSON
    /// otherwise.
    pub async fn submit_contact_form(
        &self,
        form: &ContactForm,
    ) -> Result<Envelope, SubmissionError> {
        let operation = Operation::ContactForm;
        validate(operation, form)?;

        let request = submission_request(operation, "/contact", form, form.file.as_ref())?;
        let envelope = self
            .client
            .call(request)
            .await
            .map_err(SubmissionError::api(operation))?;

        info!("📨 Contact form submitted for {}", form.email);
        self.notify_success(CONTACT_SUCCESS);
        Ok(envelope)
    }

    /// Submits a detailed service query. Same encoding rule as the contact
    /// form.
    pub async fn submit_service_query(
        &self,
        query: &ServiceQuery,
    ) -> Result<Envelope, SubmissionError> {
        let operation = Operation::ServiceQuery;
        validate(operation, query)?;

        let request =
            submission_request(operation, "/service-query", query, query.contact.file.as_ref())?;
        let envelope = self
            .client
            .call(request)
            .await
            .map_err(SubmissionError::api(operation))?;

        info!(
            "📨 Service query '{}' ({:?}) submitted for {}",
            query.service_type, query.urgency, query.contact.email
        );
        self.notify_success(SERVICE_QUERY_SUCCESS);
        Ok(envelope)
    }

    /// Submits a quote request. Always JSON.
    pub async fn submit_quote_request(
        &self,
        request: &QuoteRequest,
    ) -> Result<Envelope, SubmissionError> {
        let operation = Operation::QuoteRequest;
        let body = to_json(operation, request)?;

        let envelope = self
            .client
            .call(ApiRequest::post("/quote-request").with_json(body))
            .await
            .map_err(SubmissionError::api(operation))?;

        info!(
            "📨 Quote request for {} x {} submitted",
            request.quantity, request.product_name
        );
        self.notify_success(QUOTE_SUCCESS);
        Ok(envelope)
    }

    /// Subscribes `email` to the newsletter.
    ///
    /// Blank input is a no-op: nothing is sent, nothing is shown, and `None`
    /// is returned.
    pub async fn subscribe_newsletter(
        &self,
        email: &str,
    ) -> Result<Option<Envelope>, SubmissionError> {
        let operation = Operation::Newsletter;
        let email = email.trim();
        if email.is_empty() {
            debug!("Newsletter subscription skipped: empty email");
            return Ok(None);
        }

        let body = to_json(
            operation,
            &NewsletterSubscription {
                email: email.to_string(),
            },
        )?;
        let envelope = self
            .client
            .call(ApiRequest::post("/newsletter/subscribe").with_json(body))
            .await
            .map_err(SubmissionError::api(operation))?;

        self.notify_success(NEWSLETTER_SUCCESS);
        Ok(Some(envelope))
    }

    /// Uploads a file and returns the URL the backend stored it under.
    pub async fn upload_file(
        &self,
        file: &FileAttachment,
        kind: UploadKind,
    ) -> Result<String, SubmissionError> {
        let operation = Operation::Upload;
        validate(operation, file)?;

        let request = ApiRequest::post("/upload").with_parts(vec![
            FormPart::file("file", file.clone()),
            FormPart::text("type", kind.as_str()),
        ]);
        let uploaded: UploadedFile = self
            .client
            .call_data(request)
            .await
            .map_err(SubmissionError::api(operation))?;

        info!(
            "📤 Uploaded {} ({} bytes) as {}",
            file.file_name,
            file.len(),
            uploaded.url
        );
        Ok(uploaded.url)
    }

    /// Logs in and persists the returned token.
    ///
    /// The token is only stored (and the success notice only shown) when the
    /// envelope carries a non-empty token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Envelope<LoginData>, SubmissionError> {
        let operation = Operation::Login;
        let body = to_json(
            operation,
            &Credentials {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;

        let envelope: Envelope<LoginData> = self
            .client
            .call(ApiRequest::post("/auth/login").with_json(body))
            .await
            .map_err(SubmissionError::api(operation))?;

        match envelope.data.as_ref().map(|d| d.token.as_str()) {
            Some(token) if !token.is_empty() => {
                self.client.session().set_token(token).map_err(|e| {
                    error!("❌ Could not persist session token: {}", e);
                    SubmissionError::Session(e)
                })?;
                info!("🔑 Logged in as {}", email);
                self.notify_success(LOGIN_SUCCESS);
            }
            _ => debug!("Login response carried no token"),
        }

        Ok(envelope)
    }

    /// Logs out. The local token is cleared even if the backend call fails;
    /// that failure is still returned.
    pub async fn logout(&self) -> Result<(), SubmissionError> {
        let remote = self
            .client
            .call::<Value>(ApiRequest::post("/auth/logout").with_json(json!({})))
            .await;

        let cleared = self.client.session().clear();

        match remote {
            Ok(_) => {
                cleared?;
                info!("🔓 Logged out");
                self.notify_success(LOGOUT_SUCCESS);
                Ok(())
            }
            Err(source) => {
                if let Err(e) = cleared {
                    error!("❌ Could not clear session token: {}", e);
                }
                Err(SubmissionError::Api {
                    operation: Operation::Logout,
                    source,
                })
            }
        }
    }

    /// Whether a session token is currently persisted. No network call.
    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Profile of the user the persisted token belongs to.
    pub async fn get_current_user(&self) -> Result<UserProfile, SubmissionError> {
        self.client
            .call_data(ApiRequest::get("/auth/me"))
            .await
            .map_err(SubmissionError::api(Operation::CurrentUser))
    }

    fn notify_success(&self, message: &str) {
        self.notifier.notify(Notice::success(message));
    }
}

fn validate<T: Validate>(operation: Operation, input: &T) -> Result<(), SubmissionError> {
    input.validate().map_err(|errors| {
        debug!("{} rejected by validation: {}", operation, errors);
        SubmissionError::Invalid { operation, errors }
    })
}

fn to_json<T: Serialize>(operation: Operation, payload: &T) -> Result<Value, SubmissionError> {
    serde_json::to_value(payload).map_err(|source| SubmissionError::Encode { operation, source })
}

/// JSON when there is no file; multipart text fields plus a `file` part when
/// there is one.
fn submission_request<T: Serialize>(
    operation: Operation,
    path: &str,
    fields: &T,
    file: Option<&FileAttachment>,
) -> Result<ApiRequest, SubmissionError> {
    let request = ApiRequest::post(path);
    match file {
        None => Ok(request.with_json(to_json(operation, fields)?)),
        Some(file) => {
            let mut parts: Vec<FormPart> = form_fields(fields)
                .map_err(|source| SubmissionError::Encode { operation, source })?
                .into_iter()
                .map(|(name, value)| FormPart::text(name, value))
                .collect();
            parts.push(FormPart::file("file", file.clone()));
            Ok(request.with_parts(parts))
        }
    }
}
