//! Test utilities for cartwise-core
//!
//! This module provides a mock vision-model server that speaks both the
//! OpenAI chat-completions dialect and Ollama's generate API. It records every
//! generation request so tests can assert on what was sent.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Model output returned by a default mock server
pub const MOCK_RECEIPT_JSON: &str = r#"{"extractedItems": [
  {"name": "Colgate Toothpaste", "price": 3.50, "quantity": "75ml", "category": "health"},
  {"name": "Semi Skimmed Milk", "price": 1.65, "quantity": "2L", "category": "dairy"},
  {"name": "White Bread", "price": 0.75, "quantity": "800g", "category": "bakery"}
]}"#;

/// A generation request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
enum Reply {
    /// Successful completion whose text is this string
    Content(String),
    /// Error status with a plain-text body
    Status(u16, String),
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Mock vision server for testing and development
pub struct MockVisionServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockVisionServer {
    /// Start a server that answers every extraction with `MOCK_RECEIPT_JSON`
    pub async fn start() -> Self {
        Self::spawn(Reply::Content(MOCK_RECEIPT_JSON.to_string())).await
    }

    /// Start a server whose model "says" `content`
    pub async fn with_content(content: &str) -> Self {
        Self::spawn(Reply::Content(content.to_string())).await
    }

    /// Start a server that rejects extraction requests with `status`
    pub async fn failing(status: u16, body: &str) -> Self {
        Self::spawn(Reply::Status(status, body.to_string())).await
    }

    async fn spawn(reply: Reply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Generation requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockVisionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn record(state: &MockState, path: &str, headers: &HeaderMap, body: Value) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.to_string(),
        authorization,
        body,
    });
}

fn error_response(status: u16, body: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, body.to_string()).into_response()
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({"object": "list", "data": [{"id": "gpt-4o", "object": "model"}]}))
}

/// OpenAI chat completions endpoint
async fn handle_chat(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].as_str().unwrap_or("gpt-4o").to_string();
    record(&state, "/v1/chat/completions", &headers, body);

    match &state.reply {
        Reply::Status(status, text) => error_response(*status, text),
        Reply::Content(content) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({"models": [{"name": "llama3.2-vision:latest", "size": 7_900_000_000u64}]}))
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].as_str().unwrap_or("llava").to_string();
    record(&state, "/api/generate", &headers, body);

    match &state.reply {
        Reply::Status(status, text) => error_response(*status, text),
        Reply::Content(content) => Json(json!({
            "model": model,
            "response": content,
            "done": true
        }))
        .into_response(),
    }
}
