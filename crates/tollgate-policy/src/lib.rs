//! Tollgate policy primitives shared by the gateway service and its tests.
//!
//! # Purpose
//! Holds the I/O-free half of the enforcement pipeline: the `Template` model and
//! its schema validator, the authorization request builder, and the decision
//! parser/enforcer that interprets what the policy decision point returned.
//!
//! # How it fits
//! The gateway validates an inbound payload with [`validate_template`], turns the
//! result into an [`AuthorizationRequest`] with [`build_authorization_request`],
//! ships that to the PDP, and hands the raw response to [`enforce`].
//!
//! # Key invariants
//! - A [`ValidatedTemplate`] can only be produced by the schema validator, so the
//!   context builder never sees a partially validated resource.
//! - A malformed decision is a [`DecisionIntegrityError`], never a denial.
//!
//! # Examples
//! ```rust
//! use serde_json::json;
//! use tollgate_policy::{RequestMetadata, Verdict, build_authorization_request, enforce, validate_template};
//!
//! let payload = json!({
//!     "id": "tpl-1",
//!     "provenance": { "created_by": "alice" },
//!     "bindings": [],
//!     "lifecycle": { "transitions": [["draft", "active"]] },
//!     "spec": { "kind": "static" }
//! });
//! let template = validate_template(&payload).expect("valid");
//! let request = build_authorization_request(template, &RequestMetadata::default());
//! assert_eq!(request.actor.principal_id, "anonymous");
//!
//! let verdict = enforce(&json!({ "result": { "allow": true, "reasons": [] } })).expect("shape");
//! assert_eq!(verdict, Verdict::Proceed);
//! ```

mod action;
mod context;
mod decision;
mod errors;
mod schema;
mod template;

pub use action::Action;
pub use context::{
    ANONYMOUS_PRINCIPAL, Actor, AuthorizationRequest, RequestMetadata, build_authorization_request,
    parse_roles,
};
pub use decision::{Decision, Verdict, enforce, parse_decision};
pub use errors::{DecisionIntegrityError, ValidationIssue, ValidationIssues};
pub use schema::{FieldPath, parse_payload, validate_template};
pub use template::{
    Binding, Lifecycle, Provenance, Template, TemplateSpec, Transition, ValidatedTemplate,
};
