use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::core::config::ApiSettings;
use crate::services::ApiClient;

const ENV_KEYS: &[&str] = &[
    "AUTOGRADE_API_URL",
    "NEXT_PUBLIC_API_URL",
    "SUPABASE_URL",
    "NEXT_PUBLIC_SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
    "AUTOGRADE_REQUIRE_SUPABASE",
    "AUTOGRADE_POLL_INTERVAL_MS",
    "AUTOGRADE_REQUEST_TIMEOUT_SECONDS",
    "AUTOGRADE_CONNECT_TIMEOUT_SECONDS",
    "AUTOGRADE_ENV",
    "ENVIRONMENT",
    "AUTOGRADE_LOG_LEVEL",
    "AUTOGRADE_LOG_JSON",
    "PROMETHEUS_ENABLED",
];

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<AsyncMutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(AsyncMutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

/// A request as the fake backend saw it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) json: Option<Value>,
    pub(crate) fields: HashMap<String, String>,
    /// Multipart file parts: field name → (file name, byte length).
    pub(crate) files: HashMap<String, (String, usize)>,
}

#[derive(Debug, Clone)]
struct Canned {
    status: StatusCode,
    body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    routes: Mutex<HashMap<String, VecDeque<Canned>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeState {
    /// Pops queued responses in order; the last one keeps answering.
    fn next_response(&self, key: &str) -> Option<Canned> {
        let mut routes = self.routes.lock().expect("routes lock");
        let queue = routes.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// In-process stand-in for the grading API and PostgREST.
///
/// Responses are scripted per `"METHOD /path"`; unscripted routes get 404.
pub(crate) struct FakeBackend {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queues a JSON response. A route answers its queue in order, repeating the last entry.
    pub(crate) fn respond(&self, key: &str, status: u16, body: Value) {
        self.push(key, status, Some(body));
    }

    pub(crate) fn respond_empty(&self, key: &str, status: u16) {
        self.push(key, status, None);
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    fn push(&self, key: &str, status: u16, body: Option<Value>) {
        let status = StatusCode::from_u16(status).expect("status code");
        let mut routes = self.state.routes.lock().expect("routes lock");
        let queue = routes.entry(key.to_string()).or_default();
        // A fresh script replaces a single sticky answer.
        if queue.len() == 1 && self.was_answered(key) {
            queue.clear();
        }
        queue.push_back(Canned { status, body });
    }

    fn was_answered(&self, key: &str) -> bool {
        self.state
            .requests
            .lock()
            .expect("requests lock")
            .iter()
            .any(|request| format!("{} {}", request.method, request.path) == key)
    }
}

pub(crate) fn api_client(backend: &FakeBackend) -> ApiClient {
    ApiClient::from_settings(&ApiSettings::with_base_url(backend.url())).expect("api client")
}

async fn handle(State(state): State<Arc<FakeState>>, request: Request) -> Response {
    let mut recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(ToString::to_string),
        headers: request
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
        ..RecordedRequest::default()
    };

    let is_multipart = recorded
        .headers
        .get(header::CONTENT_TYPE.as_str())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &()).await.expect("multipart body");
        while let Some(field) = multipart.next_field().await.expect("multipart field") {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.expect("file bytes");
                    recorded.files.insert(name, (file_name, bytes.len()));
                }
                None => {
                    let text = field.text().await.expect("field text");
                    recorded.fields.insert(name, text);
                }
            }
        }
    } else {
        let bytes = to_bytes(request.into_body(), usize::MAX).await.expect("request body");
        recorded.json = serde_json::from_slice(&bytes).ok();
    }

    let key = format!("{} {}", recorded.method, recorded.path);
    state.requests.lock().expect("requests lock").push(recorded);

    match state.next_response(&key) {
        Some(Canned { status, body: Some(body) }) => (status, Json(body)).into_response(),
        Some(Canned { status, body: None }) => status.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response(),
    }
}
