//! # API Client
//!
//! The single configured entry point for every call to the backend.
//!
//! ## Responsibility
//!
//! [`ApiClient`] owns the base URL, the timeout, the transport and the
//! middleware chain. For each call it:
//! - sets the default JSON content-negotiation headers
//! - runs the request hooks (bearer token, trace)
//! - sends through the [`Transport`], bounded by the configured timeout
//! - decodes the response, or classifies the failure
//! - runs the response or error hooks exactly once
//! - returns the decoded value or the classified [`ApiError`]
//!
//! It knows nothing about contact forms or quotes; that is the
//! [`SubmissionService`](crate::service::SubmissionService)'s job.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
//! let client = ApiClient::from_config(&config, session, Arc::new(LogNotifier))?;
//!
//! let health: HealthCheckResponse = client.fetch(ApiRequest::get("/health")).await?;
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::classify::{classify, Failure};
use super::middleware::MiddlewareChain;
use super::notify::Notifier;
use super::session::SessionStore;
use super::transport::{
    ApiRequest, ApiResponse, ReqwestTransport, RequestBody, Transport, TransportError,
    JSON_CONTENT_TYPE,
};
use crate::common::config::{ApiConfig, EndpointConfig};
use crate::common::errors::ApiError;
use crate::common::messages::Envelope;

/// Where and how long to talk to the backend.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&EndpointConfig> for ClientSettings {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        }
    }
}

/// Configured HTTP client with interception.
///
/// Stateless across calls apart from the session store it was given.
#[derive(Clone)]
pub struct ApiClient {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    chain: MiddlewareChain,
}

impl ApiClient {
    /// Builds a production client: [`ReqwestTransport`] and the standard
    /// middleware chain.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn from_config(
        config: &ApiConfig,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, TransportError> {
        let settings = ClientSettings::from(&config.api);
        let transport = Arc::new(ReqwestTransport::with_timeout(settings.timeout)?);
        let chain = MiddlewareChain::standard(session.clone(), notifier, config.api.verbose);
        Ok(Self::with_transport(settings, transport, session, chain))
    }

    /// Builds a client around any transport and chain.
    pub fn with_transport(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        chain: MiddlewareChain,
    ) -> Self {
        Self {
            settings,
            transport,
            session,
            chain,
        }
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Absolute URL for a path below the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends a request and decodes the response with `decode`.
    ///
    /// A non-2xx status, a transport failure, a timeout or a decode failure is
    /// classified, passed through the error hooks, and returned.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failure.
    pub async fn send<T, F>(&self, mut request: ApiRequest, decode: F) -> Result<T, ApiError>
    where
        F: FnOnce(&ApiResponse) -> Result<T, Failure>,
    {
        request.set_header("Accept", JSON_CONTENT_TYPE);
        if matches!(request.body, RequestBody::Json(_)) {
            request.set_header("Content-Type", JSON_CONTENT_TYPE);
        }

        self.chain.before(&mut request);

        let outcome = match self.round_trip(&request).await {
            Ok(response) if response.is_success() => decode(&response).map(|value| (value, response)),
            Ok(response) => Err(Failure::Status {
                status: response.status,
                body: response.body,
            }),
            Err(e) => Err(Failure::Transport(e)),
        };

        match outcome {
            Ok((value, response)) => {
                self.chain.after(&request, &response);
                Ok(value)
            }
            Err(failure) => {
                let error = classify(&failure);
                self.chain.failed(&request, &error);
                Err(error)
            }
        }
    }

    /// Sends a request and decodes a plain (non-enveloped) JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request, |response| decode_json(&response.body)).await
    }

    /// Sends a request and decodes the response [`Envelope`].
    ///
    /// An envelope with `success: false` is a failure even on a 2xx status.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        self.send(request, decode_envelope::<T>).await
    }

    /// Like [`call`](Self::call), but requires `data` to be present and
    /// returns it.
    pub async fn call_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request, |response| {
            decode_envelope::<T>(response)?
                .data
                .ok_or_else(|| Failure::Decode("envelope carried no data".to_string()))
        })
        .await
    }

    async fn round_trip(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!("{} {} (timeout {:?})", request.method, url, self.settings.timeout);

        match tokio::time::timeout(self.settings.timeout, self.transport.send(&url, request)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, Failure> {
    serde_json::from_slice(body).map_err(|e| Failure::Decode(e.to_string()))
}

fn decode_envelope<T: DeserializeOwned>(response: &ApiResponse) -> Result<Envelope<T>, Failure> {
    let envelope: Envelope<T> = decode_json(&response.body)?;
    if envelope.success {
        Ok(envelope)
    } else {
        Err(Failure::Rejected {
            status: response.status,
            message: envelope.message,
            errors: envelope.errors.unwrap_or_default(),
        })
    }
}
