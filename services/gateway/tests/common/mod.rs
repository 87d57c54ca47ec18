#![allow(dead_code)]

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use gateway::app::{AppState, build_router, build_state};
use gateway::config::{GatewayConfig, PdpConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn register_request(body: Value, principal: Option<&str>, roles: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/templates")
        .header("content-type", "application/json");
    if let Some(principal) = principal {
        builder = builder.header("x-principal-id", principal);
    }
    if let Some(roles) = roles {
        builder = builder.header("x-roles", roles);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn sample_template(id: &str) -> Value {
    serde_json::json!({
        "id": id,
        "provenance": { "created_by": "alice" },
        "bindings": [
            { "role": "owner", "principal": "alice" },
            { "role": "operator", "principal": "bob" }
        ],
        "lifecycle": { "transitions": [["draft", "active"], ["active", "retired"]] },
        "spec": { "kind": "job", "exec": "run.sh" }
    })
}

pub fn allow_body() -> Value {
    serde_json::json!({ "result": { "allow": true, "reasons": [] } })
}

pub fn gateway_config(pdp_url: Option<String>, timeout_ms: u64) -> GatewayConfig {
    GatewayConfig {
        bind_addr: "127.0.0.1:0".parse().expect("bind"),
        metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
        pdp: PdpConfig {
            url: pdp_url,
            timeout_ms,
            ..PdpConfig::default()
        },
        max_body_bytes: 16 * 1024,
    }
}

pub fn gateway_state(pdp_url: Option<String>) -> AppState {
    build_state(&gateway_config(pdp_url, 1000)).expect("state")
}

pub fn gateway_app(state: AppState) -> axum::routing::RouterIntoService<Body, ()> {
    build_router(state).into_service()
}

/// Canned behaviour for the mock decision point.
#[derive(Clone)]
pub enum PdpReply {
    Json(Value),
    Status(u16),
    Raw(&'static str),
    Delayed(Duration, Value),
}

pub struct MockPdp {
    reply: PdpReply,
    hits: AtomicUsize,
    last_input: Mutex<Option<Value>>,
    last_content_type: Mutex<Option<String>>,
}

impl MockPdp {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<Value> {
        self.last_input.lock().expect("lock").clone()
    }

    pub fn last_content_type(&self) -> Option<String> {
        self.last_content_type.lock().expect("lock").clone()
    }
}

async fn decide(
    State(mock): State<Arc<MockPdp>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    *mock.last_content_type.lock().expect("lock") = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    *mock.last_input.lock().expect("lock") = body.get("input").cloned();
    match mock.reply.clone() {
        PdpReply::Json(value) => Json(value).into_response(),
        PdpReply::Status(code) => StatusCode::from_u16(code)
            .expect("status")
            .into_response(),
        PdpReply::Raw(text) => text.into_response(),
        PdpReply::Delayed(delay, value) => {
            tokio::time::sleep(delay).await;
            Json(value).into_response()
        }
    }
}

/// Spawn a decision point on an ephemeral port. Returns the decision URL.
pub async fn spawn_mock_pdp(reply: PdpReply) -> (String, Arc<MockPdp>) {
    let mock = Arc::new(MockPdp {
        reply,
        hits: AtomicUsize::new(0),
        last_input: Mutex::new(None),
        last_content_type: Mutex::new(None),
    });
    let app = axum::Router::new()
        .route("/v1/data/templates/decision", axum::routing::post(decide))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock pdp");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    wait_for_listen(addr).await;
    (format!("http://{addr}/v1/data/templates/decision"), mock)
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr")
}

pub async fn wait_for_listen(addr: SocketAddr) {
    let deadline = Instant::now() + Duration::from_secs(1);
    while tokio::net::TcpStream::connect(addr).await.is_err() {
        assert!(Instant::now() < deadline, "server never listened on {addr}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
