//! Authorization context construction.
//!
//! # Purpose
//! Derives the actor and action for a PDP query from request metadata and an
//! already validated template.
//!
//! # Key invariants
//! - Pure function of its inputs; no I/O and no clock.
//! - Missing principal → `anonymous`; missing or empty roles → empty set.
//!
//! # Security considerations
//! - Metadata is trusted as supplied. Authenticating the caller is the job of
//!   whatever sits in front of the gateway.
use crate::action::Action;
use crate::template::{Template, ValidatedTemplate};
use serde::Serialize;
use std::collections::BTreeSet;

pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Identity claims lifted from the inbound request, both optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub principal_id: Option<String>,
    /// Comma-delimited role list as received.
    pub roles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub principal_id: String,
    pub roles: BTreeSet<String>,
}

/// The `input` document sent to the PDP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub action: Action,
    pub actor: Actor,
    pub resource: ValidatedTemplate,
}

impl AuthorizationRequest {
    pub fn template(&self) -> &Template {
        self.resource.as_template()
    }

    pub fn into_template(self) -> Template {
        self.resource.into_inner()
    }
}

/// Split a comma-delimited role list, dropping empty tokens.
///
/// Tokens are trimmed first, so `"admin, ,viewer"` yields `{admin, viewer}`.
pub fn parse_roles(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|roles| {
        roles
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Build the PDP request for registering `template`.
pub fn build_authorization_request(
    template: ValidatedTemplate,
    metadata: &RequestMetadata,
) -> AuthorizationRequest {
    let principal_id = metadata
        .principal_id
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_PRINCIPAL)
        .to_string();
    AuthorizationRequest {
        action: Action::RegisterTemplate,
        actor: Actor {
            principal_id,
            roles: parse_roles(metadata.roles.as_deref()),
        },
        resource: template,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_template;
    use serde_json::json;

    fn template() -> ValidatedTemplate {
        validate_template(&json!({
            "id": "tpl-1",
            "provenance": { "created_by": "alice" },
            "bindings": [],
            "lifecycle": { "transitions": [] },
            "spec": { "kind": "static" }
        }))
        .expect("valid")
    }

    fn roles(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn absent_metadata_defaults_to_anonymous_without_roles() {
        let request = build_authorization_request(template(), &RequestMetadata::default());
        assert_eq!(request.actor.principal_id, ANONYMOUS_PRINCIPAL);
        assert!(request.actor.roles.is_empty());
        assert_eq!(request.action, Action::RegisterTemplate);
    }

    #[test]
    fn empty_principal_counts_as_absent() {
        let metadata = RequestMetadata {
            principal_id: Some(String::new()),
            roles: Some(String::new()),
        };
        let request = build_authorization_request(template(), &metadata);
        assert_eq!(request.actor.principal_id, ANONYMOUS_PRINCIPAL);
        assert!(request.actor.roles.is_empty());
    }

    #[test]
    fn empty_role_tokens_are_dropped() {
        assert_eq!(parse_roles(Some("admin,,viewer,")), roles(&["admin", "viewer"]));
        assert_eq!(parse_roles(Some(",,,")), BTreeSet::new());
        assert_eq!(parse_roles(None), BTreeSet::new());
    }

    #[test]
    fn role_tokens_are_trimmed_and_deduplicated() {
        assert_eq!(
            parse_roles(Some(" admin , viewer,admin")),
            roles(&["admin", "viewer"])
        );
    }

    #[test]
    fn serialized_request_matches_wire_contract() {
        let metadata = RequestMetadata {
            principal_id: Some("user-7".to_string()),
            roles: Some("viewer,admin".to_string()),
        };
        let request = build_authorization_request(template(), &metadata);
        let encoded = serde_json::to_value(&request).expect("encode");
        assert_eq!(
            encoded,
            json!({
                "action": "register_template",
                "actor": { "principal_id": "user-7", "roles": ["admin", "viewer"] },
                "resource": {
                    "id": "tpl-1",
                    "provenance": { "created_by": "alice" },
                    "bindings": [],
                    "lifecycle": { "transitions": [] },
                    "spec": { "kind": "static" }
                }
            })
        );
    }
}
