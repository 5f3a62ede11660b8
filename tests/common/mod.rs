//! Mock backend for the integration tests.
//!
//! Serves the API under `/api` on an ephemeral local port. Every request is
//! captured. JSON bodies are echoed back as envelope `data`, so tests can
//! check what actually went over the wire. Individual paths can be scripted to
//! fail or stall.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{multipart::Multipart, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use wholesale_client::client::{
    ApiClient, ClientSettings, FileSessionStore, MemoryNotifier, MiddlewareChain,
    ReqwestTransport, SessionStore,
};
use wholesale_client::SubmissionService;

pub const TEST_TOKEN: &str = "test-token";

/// What the backend saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
    /// Text fields and file names of a parsed multipart body
    pub fields: HashMap<String, String>,
}

impl Captured {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("captured body is JSON")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    }
}

/// Scripted behaviour for a path.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Respond(u16, Value),
    Stall(Duration),
}

#[derive(Default)]
pub struct BackendState {
    captured: Mutex<Vec<Captured>>,
    scripted: Mutex<HashMap<String, Behaviour>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/api/upload", post(upload_handler))
            .fallback(capture_handler)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    /// Makes every request to `path` (below `/api`) behave as scripted.
    pub fn script(&self, path: &str, behaviour: Behaviour) {
        self.state
            .scripted
            .lock()
            .unwrap()
            .insert(path.to_string(), behaviour);
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }

    pub fn captured_for(&self, path: &str) -> Vec<Captured> {
        self.captured()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }
}

/// A submission service on the real reqwest transport and the standard chain,
/// with a file-backed session store in a temp dir.
pub struct TestClient {
    pub service: SubmissionService,
    pub session: Arc<FileSessionStore>,
    pub notifier: Arc<MemoryNotifier>,
    _dir: TempDir,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let session = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
        let notifier = Arc::new(MemoryNotifier::new());

        let transport = Arc::new(ReqwestTransport::with_timeout(timeout).expect("reqwest client"));
        let chain = MiddlewareChain::standard(session.clone(), notifier.clone(), true);
        let client = ApiClient::with_transport(
            ClientSettings {
                base_url: base_url.to_string(),
                timeout,
            },
            transport,
            session.clone(),
            chain,
        );

        Self {
            service: SubmissionService::new(client, notifier.clone()),
            session,
            notifier,
            _dir: dir,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn api_path(uri: &Uri) -> String {
    uri.path().strip_prefix("/api").unwrap_or(uri.path()).to_string()
}

fn respond(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

async fn apply_script(state: &BackendState, path: &str) -> Option<Response> {
    let behaviour = state.scripted.lock().unwrap().get(path).cloned();
    match behaviour {
        Some(Behaviour::Respond(status, body)) => Some(respond(status, body)),
        Some(Behaviour::Stall(delay)) => {
            tokio::time::sleep(delay).await;
            Some(respond(200, json!({ "success": true })))
        }
        None => None,
    }
}

async fn capture_handler(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = api_path(&uri);
    let authorization = header_value(&headers, header::AUTHORIZATION);
    let content_type = header_value(&headers, header::CONTENT_TYPE);

    state.captured.lock().unwrap().push(Captured {
        method: method.to_string(),
        path: path.clone(),
        content_type: content_type.clone(),
        authorization: authorization.clone(),
        body: body.to_vec(),
        fields: HashMap::new(),
    });

    if let Some(response) = apply_script(&state, &path).await {
        return response;
    }

    match path.as_str() {
        "/health" => respond(
            200,
            json!({
                "status": "ok",
                "timestamp": "2026-10-16T09:00:00Z",
                "version": "1.4.2",
                "uptime": 86400.5
            }),
        ),
        "/auth/login" => respond(
            200,
            json!({
                "success": true,
                "message": "Welcome back",
                "data": { "token": TEST_TOKEN, "user": { "id": 17, "email": "buyer@example.com" } }
            }),
        ),
        "/auth/me" => {
            if authorization.as_deref() == Some(&format!("Bearer {}", TEST_TOKEN)) {
                respond(
                    200,
                    json!({
                        "success": true,
                        "data": { "id": 17, "name": "Buyer", "email": "buyer@example.com", "tier": "gold" }
                    }),
                )
            } else {
                respond(401, json!({ "success": false, "message": "Token expired" }))
            }
        }
        _ => {
            let is_json = content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("application/json"));
            let data = if is_json {
                serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null)
            } else {
                Value::Null
            };
            respond(200, json!({ "success": true, "message": "received", "data": data }))
        }
    }
}

async fn upload_handler(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut fields = HashMap::new();
    let mut file_bytes = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            file_bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            fields.insert(name, file_name);
        } else {
            let text = field.text().await.unwrap_or_default();
            fields.insert(name, text);
        }
    }

    state.captured.lock().unwrap().push(Captured {
        method: "POST".to_string(),
        path: "/upload".to_string(),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        authorization: header_value(&headers, header::AUTHORIZATION),
        body: file_bytes,
        fields: fields.clone(),
    });

    if let Some(response) = apply_script(&state, "/upload").await {
        return response;
    }

    match (fields.get("type"), fields.get("file")) {
        (Some(kind), Some(file_name)) => respond(
            200,
            json!({
                "success": true,
                "data": { "url": format!("https://files.chwh.store/{}/{}", kind, file_name) }
            }),
        ),
        _ => respond(
            422,
            json!({ "success": false, "message": "file and type are required" }),
        ),
    }
}
