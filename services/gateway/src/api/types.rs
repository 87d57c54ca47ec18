//! HTTP API request/response types.
//!
//! # Purpose
//! Payload shapes for the gateway REST API and OpenAPI schema generation.
use serde::{Deserialize, Serialize};
use tollgate_policy::ValidationIssue;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub api_version: String,
    pub pdp_configured: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Body of a 400 for a template that failed schema validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchemaErrorResponse {
    pub error: String,
    pub issues: Vec<ValidationIssue>,
}

/// Body of a 403 for a registration the PDP denied.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeniedResponse {
    pub message: String,
    pub reasons: Vec<String>,
}
