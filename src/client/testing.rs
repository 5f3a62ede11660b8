//! Scripted transport and a ready-wired client for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::{ApiClient, ClientSettings};
use super::middleware::MiddlewareChain;
use super::notify::MemoryNotifier;
use super::session::{MemorySessionStore, SessionError, SessionStore};
use super::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// A request as the transport saw it, after the middleware chain ran.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub url: String,
    pub request: ApiRequest,
}

/// Answers requests from a queue of scripted outcomes.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    sent: Mutex<Vec<SentRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.push(Ok(ApiResponse::new(status, body.to_string())));
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.push(Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, error: TransportError) {
        self.push(Err(error));
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn push(&self, outcome: Result<ApiResponse, TransportError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            request: request.clone(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::NoResponse("nothing scripted".to_string())))
    }
}

/// Memory store that counts effective removals.
#[derive(Default)]
pub struct CountingSessionStore {
    inner: MemorySessionStore,
    removals: AtomicUsize,
}

impl CountingSessionStore {
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl SessionStore for CountingSessionStore {
    fn token(&self) -> Option<String> {
        self.inner.token()
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        self.inner.set_token(token)
    }

    fn clear(&self) -> Result<bool, SessionError> {
        let removed = self.inner.clear()?;
        if removed {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}

/// A client on the standard chain, a scripted transport, a counting session
/// store and a recording notifier.
pub struct TestHarness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub session: Arc<CountingSessionStore>,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestHarness {
    pub fn new(base_url: &str) -> Self {
        Self::build(
            Arc::new(ScriptedTransport::new()),
            base_url,
            Duration::from_secs(10),
        )
    }

    pub fn with_transport(transport: Arc<ScriptedTransport>, timeout: Duration) -> Self {
        Self::build(transport, "http://backend", timeout)
    }

    fn build(transport: Arc<ScriptedTransport>, base_url: &str, timeout: Duration) -> Self {
        let session = Arc::new(CountingSessionStore::default());
        let notifier = Arc::new(MemoryNotifier::new());
        let chain = MiddlewareChain::standard(session.clone(), notifier.clone(), true);
        let client = ApiClient::with_transport(
            ClientSettings {
                base_url: base_url.to_string(),
                timeout,
            },
            transport.clone(),
            session.clone(),
            chain,
        );

        Self {
            client,
            transport,
            session,
            notifier,
        }
    }
}
