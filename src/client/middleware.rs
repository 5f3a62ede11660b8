//! # Client Middleware
//!
//! Cross-cutting concerns of every backend call, expressed as an ordered chain
//! of [`Middleware`] values wrapped around the transport.
//!
//! ## Responsibilities
//!
//! - **Auth attachment** ([`BearerAuth`]): adds `Authorization: Bearer <token>`
//!   when the session store holds a token
//! - **Tracing** ([`RequestTrace`]): logs method, path and status in verbose
//!   mode, and every failure regardless of mode
//! - **Session invalidation** ([`SessionInvalidation`]): clears the stored
//!   token on an `Unauthorized` failure
//! - **Error notification** ([`ErrorNotification`]): shows exactly one notice
//!   per failed call
//!
//! ## Hook order
//!
//! For a single call the [`ApiClient`](super::client::ApiClient) runs:
//!
//! 1. `on_request` of every middleware, in chain order
//! 2. the transport round trip
//! 3. either `on_response` or `on_error` of every middleware, in chain order
//!
//! Each hook runs at most once per call. Response hooks only get a shared
//! reference, so nothing in the chain can alter what the caller receives.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let chain = MiddlewareChain::standard(session.clone(), notifier.clone(), config.api.verbose);
//! let client = ApiClient::with_transport(settings, transport, session, chain);
//! ```

use log::{error, info, warn};
use std::sync::Arc;

use super::notify::{Notice, Notifier};
use super::session::SessionStore;
use super::transport::{ApiRequest, ApiResponse};
use crate::common::errors::{ApiError, ErrorKind};

/// One link in the chain. Every hook defaults to doing nothing.
pub trait Middleware: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs before the request is sent. May add or replace headers.
    fn on_request(&self, _request: &mut ApiRequest) {}

    /// Runs after a successful response.
    fn on_response(&self, _request: &ApiRequest, _response: &ApiResponse) {}

    /// Runs after a failure has been classified, before the caller sees it.
    fn on_error(&self, _request: &ApiRequest, _error: &ApiError) {}
}

/// Ordered sequence of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    links: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain every production client runs: auth, trace, session
    /// invalidation, error notification.
    pub fn standard(
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        verbose: bool,
    ) -> Self {
        Self::new()
            .with(BearerAuth::new(session.clone()))
            .with(RequestTrace::new(verbose))
            .with(SessionInvalidation::new(session))
            .with(ErrorNotification::new(notifier))
    }

    /// Appends a middleware to the end of the chain.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.links.push(Arc::new(middleware));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.links.iter().map(|m| m.name()).collect()
    }

    pub fn before(&self, request: &mut ApiRequest) {
        for link in &self.links {
            link.on_request(request);
        }
    }

    pub fn after(&self, request: &ApiRequest, response: &ApiResponse) {
        for link in &self.links {
            link.on_response(request, response);
        }
    }

    pub fn failed(&self, request: &ApiRequest, error: &ApiError) {
        for link in &self.links {
            link.on_error(request, error);
        }
    }
}

/// Attaches the stored session token as a bearer credential.
pub struct BearerAuth {
    session: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn on_request(&self, request: &mut ApiRequest) {
        match self.session.token() {
            Some(token) => request.set_header("Authorization", format!("Bearer {}", token)),
            None => request
                .headers
                .retain(|(k, _)| !k.eq_ignore_ascii_case("authorization")),
        }
    }
}

/// Diagnostic trace of requests and responses.
///
/// Successful traffic is only logged when `verbose` is set; failures are always
/// logged.
pub struct RequestTrace {
    verbose: bool,
}

impl RequestTrace {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Middleware for RequestTrace {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn on_request(&self, request: &mut ApiRequest) {
        if self.verbose {
            info!(
                "🚀 API Request [{}]: {} {}",
                request.id, request.method, request.path
            );
        }
    }

    fn on_response(&self, request: &ApiRequest, response: &ApiResponse) {
        if self.verbose {
            info!("✅ API Response {}", response_line(request, response));
        }
    }

    fn on_error(&self, request: &ApiRequest, error: &ApiError) {
        error!(
            "❌ API Error [{}]: {} {} -> {} ({})",
            request.id, request.method, request.path, error.kind, error.detail
        );
    }
}

fn response_line(request: &ApiRequest, response: &ApiResponse) -> String {
    format!(
        "[{}]: {} {} -> {}",
        request.id, request.method, request.path, response.status
    )
}

/// Clears the persisted session token when the backend rejects it.
pub struct SessionInvalidation {
    session: Arc<dyn SessionStore>,
}

impl SessionInvalidation {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for SessionInvalidation {
    fn name(&self) -> &'static str {
        "session-invalidation"
    }

    fn on_error(&self, request: &ApiRequest, error: &ApiError) {
        if error.kind != ErrorKind::Unauthorized {
            return;
        }
        match self.session.clear() {
            Ok(true) => info!("🔒 Session token cleared after 401 on {}", request.path),
            Ok(false) => {}
            Err(e) => warn!("⚠️  Failed to clear session token: {}", e),
        }
    }
}

/// Shows one user-facing notice per failed call.
pub struct ErrorNotification {
    notifier: Arc<dyn Notifier>,
}

impl ErrorNotification {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Middleware for ErrorNotification {
    fn name(&self) -> &'static str {
        "error-notification"
    }

    fn on_error(&self, _request: &ApiRequest, error: &ApiError) {
        self.notifier.notify(Notice::error(error.message.clone()));
    }
}
