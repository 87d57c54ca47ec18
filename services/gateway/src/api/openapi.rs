//! OpenAPI schema aggregation for the gateway API.
use crate::api::{
    system, templates,
    types::{DeniedResponse, ErrorResponse, HealthStatus, SchemaErrorResponse, SystemInfo},
};
use tollgate_policy::{Binding, Lifecycle, Provenance, Template, TemplateSpec, ValidationIssue};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tollgate-gateway",
        version = "v1",
        description = "Policy-gated template registration API"
    ),
    paths(
        system::system_info,
        system::system_health,
        templates::register_template,
    ),
    components(schemas(
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        SchemaErrorResponse,
        DeniedResponse,
        ValidationIssue,
        Template,
        Provenance,
        Binding,
        Lifecycle,
        TemplateSpec,
    )),
    tags(
        (name = "system", description = "Service metadata and probes"),
        (name = "templates", description = "Template registration behind policy enforcement")
    )
)]
pub struct ApiDoc;
