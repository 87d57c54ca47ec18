//! Template resource model.
//!
//! # Purpose
//! Typed representation of the resource whose registration is gated by policy.
//!
//! # Key invariants
//! - Lifecycle transitions are always `[from, to]` pairs on the wire.
//! - [`ValidatedTemplate`] has no public constructor; only the schema validator
//!   builds one.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: String,
    pub provenance: Provenance,
    pub bindings: Vec<Binding>,
    pub lifecycle: Lifecycle,
    pub spec: TemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Provenance {
    pub created_by: String,
}

/// Role-to-principal grant attached to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Binding {
    pub role: String,
    pub principal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Lifecycle {
    #[schema(value_type = Vec<Vec<String>>)]
    pub transitions: Vec<Transition>,
}

/// Permitted lifecycle edge, encoded as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Transition {
    pub from: String,
    pub to: String,
}

impl From<(String, String)> for Transition {
    fn from((from, to): (String, String)) -> Self {
        Self { from, to }
    }
}

impl From<Transition> for (String, String) {
    fn from(transition: Transition) -> Self {
        (transition.from, transition.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
}

/// A template that passed every schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedTemplate(Template);

impl ValidatedTemplate {
    pub(crate) fn new(template: Template) -> Self {
        Self(template)
    }

    pub fn as_template(&self) -> &Template {
        &self.0
    }

    pub fn into_inner(self) -> Template {
        self.0
    }
}

impl std::ops::Deref for ValidatedTemplate {
    type Target = Template;

    fn deref(&self) -> &Template {
        &self.0
    }
}
