//! Gateway HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, places the enforcement middleware in front of the
//! protected routes, and defines the shared state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::config::GatewayConfig;
use crate::observability;
use crate::pdp::{DecisionPoint, PolicyClient};
use crate::store::TemplateStore;
use crate::store::memory::InMemoryStore;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

pub const SERVICE_NAME: &str = "tollgate-gateway";
pub const API_VERSION: &str = "v1";

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub api_version: String,
    pub decision_point: Arc<dyn DecisionPoint>,
    pub store: Arc<dyn TemplateStore>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        decision_point: Arc<dyn DecisionPoint>,
        store: Arc<dyn TemplateStore>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            api_version: API_VERSION.to_string(),
            decision_point,
            store,
            max_body_bytes,
        }
    }
}

/// Wire the PDP client and template store from startup configuration.
///
/// # Errors
/// - The PDP client cannot be built from `config.pdp`.
pub fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let client = PolicyClient::new(&config.pdp)?;
    if client.is_configured() {
        tracing::info!(
            endpoint = ?client.endpoint().map(|url| url.as_str()),
            timeout_ms = client.timeout().as_millis() as u64,
            "policy decision point configured"
        );
    } else {
        tracing::warn!("no policy decision point configured; registrations will fail closed");
    }
    let store = InMemoryStore::new();
    tracing::info!(backend = store.backend_name(), "template store ready");
    Ok(AppState::new(
        Arc::new(client),
        Arc::new(store),
        config.max_body_bytes,
    ))
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    // Layered on the method router so its 405 fallback never reaches the PDP.
    let register = axum::routing::post(api::templates::register_template).route_layer(
        axum::middleware::from_fn_with_state(state.clone(), api::enforce::enforce_policy),
    );

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/v1/openapi.json", axum::routing::get(openapi_document))
        .route("/v1/templates", register)
        .layer(trace_layer)
        .with_state(state)
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
