//! Policy enforcement middleware.
//!
//! # Purpose and responsibility
//! Sits in front of every protected route. Buffers the body, runs the
//! enforcement pipeline, and either short-circuits with the mapped error or
//! forwards the request with an [`AuthorizedRegistration`] attached.
//!
//! # Key invariants
//! - The inner handler runs only after an explicit `allow: true`.
//! - Dropping the request future cancels the in-flight PDP query.
use crate::api::error::{ApiError, api_payload_too_large, api_unreadable_body};
use crate::app::AppState;
use crate::pipeline::{self, AuthorizedRegistration};
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tokio_util::sync::CancellationToken;
use tollgate_policy::RequestMetadata;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";
pub const ROLES_HEADER: &str = "x-roles";

pub async fn enforce_policy(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = state.max_body_bytes;
    if declared_length(request.headers()).is_some_and(|length| length > limit) {
        return Err(api_payload_too_large(limit));
    }

    let metadata = request_metadata(request.headers());
    let (mut parts, body) = request.into_parts();
    let body = read_body(body, limit).await?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let authorized =
        pipeline::evaluate(&body, &metadata, state.decision_point.as_ref(), &cancel).await?;

    parts.extensions.insert::<AuthorizedRegistration>(authorized);
    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

/// Buffer at most `limit` bytes of the request body.
///
/// # Errors
/// - 413 when the body is longer than `limit`.
/// - 400 when the body stream fails, e.g. the client went away mid-upload.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) => Err(body_error(&*err, limit)),
    }
}

fn body_error(err: &(dyn std::error::Error + Send + Sync + 'static), limit: usize) -> ApiError {
    if err.is::<LengthLimitError>() {
        tracing::debug!(limit, "request body over limit");
        api_payload_too_large(limit)
    } else {
        tracing::warn!(error = %err, "failed to read request body");
        api_unreadable_body()
    }
}

/// Read caller identity from the inbound headers. Values that are not valid
/// UTF-8 count as absent.
pub fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    RequestMetadata {
        principal_id: read(PRINCIPAL_HEADER),
        roles: read(ROLES_HEADER),
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
