//! Template registration handlers.
//!
//! `register_template` sits behind [`enforce_policy`](crate::api::enforce::enforce_policy)
//! and only ever sees requests the PDP allowed.
use crate::api::error::{ApiError, api_conflict};
use crate::app::AppState;
use crate::pipeline::AuthorizedRegistration;
use crate::store::StoreError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tollgate_policy::Template;

#[utoipa::path(
    post,
    path = "/v1/templates",
    tag = "templates",
    request_body = Template,
    params(
        ("x-principal-id" = Option<String>, Header, description = "Caller identity; anonymous when absent"),
        ("x-roles" = Option<String>, Header, description = "Comma-separated caller roles")
    ),
    responses(
        (status = 201, description = "Template registered", body = Template),
        (status = 400, description = "Template failed schema validation", body = crate::api::types::SchemaErrorResponse),
        (status = 403, description = "Forbidden by policy", body = crate::api::types::DeniedResponse),
        (status = 409, description = "Template already exists", body = crate::api::types::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Policy decision unavailable", body = String, content_type = "text/plain")
    )
)]
pub(crate) async fn register_template(
    State(state): State<AppState>,
    Extension(authorized): Extension<AuthorizedRegistration>,
) -> Result<impl IntoResponse, ApiError> {
    let principal_id = authorized.principal_id().to_string();
    match state.store.register(authorized.into_template()).await {
        Ok(template) => {
            tracing::info!(template_id = %template.id, %principal_id, "template registered");
            Ok((StatusCode::CREATED, Json(template)))
        }
        Err(StoreError::Conflict(_)) => {
            Err(api_conflict("already_exists", "template already exists"))
        }
    }
}
