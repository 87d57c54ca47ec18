//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Turns every terminal pipeline outcome and store failure into an HTTP
//! response with a stable status and body shape.
//!
//! # Key invariants
//! - Schema failures are 400 JSON with every issue listed.
//! - Denials are 403 JSON with the PDP's reasons verbatim.
//! - Configuration, PDP and integrity failures are 500 plain text; details
//!   stay in the server log.
use crate::api::types::{DeniedResponse, ErrorResponse, SchemaErrorResponse};
use crate::pipeline::PepError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tollgate_policy::ValidationIssues;

pub const SCHEMA_ERROR_MESSAGE: &str = "Invalid template schema";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden by policy";
pub const INTERNAL_ERROR_TEXT: &str = "Internal Server Error";

#[derive(Debug)]
pub enum ApiErrorBody {
    Error(ErrorResponse),
    Schema(SchemaErrorResponse),
    Denied(DeniedResponse),
    Text(String),
}

/// Structured API error returned by handlers and the enforcement middleware.
///
/// # Invariants
/// - `status` must match the semantics of `body`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.body {
            ApiErrorBody::Error(body) => (self.status, Json(body)).into_response(),
            ApiErrorBody::Schema(body) => (self.status, Json(body)).into_response(),
            ApiErrorBody::Denied(body) => (self.status, Json(body)).into_response(),
            ApiErrorBody::Text(body) => (self.status, body).into_response(),
        }
    }
}

/// Build a 400 listing every schema issue.
pub fn api_schema_invalid(issues: ValidationIssues) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ApiErrorBody::Schema(SchemaErrorResponse {
            error: SCHEMA_ERROR_MESSAGE.to_string(),
            issues: issues.into_vec(),
        }),
    }
}

/// Build a 403 carrying the PDP's denial reasons.
pub fn api_forbidden_by_policy(reasons: Vec<String>) -> ApiError {
    ApiError {
        status: StatusCode::FORBIDDEN,
        body: ApiErrorBody::Denied(DeniedResponse {
            message: FORBIDDEN_MESSAGE.to_string(),
            reasons,
        }),
    }
}

/// Build a plain-text 500 naming the configuration problem.
pub fn api_config_error(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ApiErrorBody::Text(message.to_string()),
    }
}

/// Build the generic plain-text 500.
pub fn api_internal_text() -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ApiErrorBody::Text(INTERNAL_ERROR_TEXT.to_string()),
    }
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    ApiError {
        status: StatusCode::CONFLICT,
        body: ApiErrorBody::Error(ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        }),
    }
}

pub fn api_payload_too_large(limit: usize) -> ApiError {
    ApiError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        body: ApiErrorBody::Error(ErrorResponse {
            code: "payload_too_large".to_string(),
            message: format!("request body exceeds {limit} bytes"),
            request_id: None,
        }),
    }
}

pub fn api_unreadable_body() -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ApiErrorBody::Error(ErrorResponse {
            code: "unreadable_body".to_string(),
            message: "failed to read request body".to_string(),
            request_id: None,
        }),
    }
}

impl From<PepError> for ApiError {
    fn from(err: PepError) -> Self {
        match err {
            PepError::Validation(issues) => api_schema_invalid(issues),
            PepError::Denied { reasons } => api_forbidden_by_policy(reasons),
            PepError::Config(err) => api_config_error(&err.to_string()),
            PepError::PolicyQuery(_) | PepError::DecisionIntegrity(_) => api_internal_text(),
        }
    }
}
