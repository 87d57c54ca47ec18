//! Validate → contextualize → decide → enforce.
//!
//! # Purpose
//! Drives one registration attempt through the four enforcement stages and
//! reduces every way it can end to either an [`AuthorizedRegistration`] or a
//! [`PepError`].
//!
//! # Key invariants
//! - Stages run strictly in order; the first failure ends the attempt.
//! - Schema failures never reach the decision point.
//! - The only successful outcome is a well-formed `allow: true` decision.
//!
//! # Concurrency
//! No state is shared between attempts; the decision point is borrowed
//! read-only and the cancellation token belongs to the inbound request.
use crate::pdp::{ConfigError, DecisionPoint, PdpError, PolicyQueryError};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tollgate_policy::{
    AuthorizationRequest, DecisionIntegrityError, RequestMetadata, Template, ValidationIssues,
    Verdict, build_authorization_request, enforce, parse_payload, validate_template,
};

/// Per-request progress through the enforcement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    ContextBuilt,
    DecisionRequested,
    DecisionReceived,
    Allowed,
    Denied,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::ContextBuilt => "context_built",
            Stage::DecisionRequested => "decision_requested",
            Stage::DecisionReceived => "decision_received",
            Stage::Allowed => "allowed",
            Stage::Denied => "denied",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PepError {
    #[error(transparent)]
    Validation(ValidationIssues),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    PolicyQuery(#[from] PolicyQueryError),
    #[error("decision integrity violation: {0}")]
    DecisionIntegrity(#[from] DecisionIntegrityError),
    #[error("forbidden by policy")]
    Denied { reasons: Vec<String> },
}

impl From<PdpError> for PepError {
    fn from(err: PdpError) -> Self {
        match err {
            PdpError::Config(err) => PepError::Config(err),
            PdpError::Query(err) => PepError::PolicyQuery(err),
        }
    }
}

impl PepError {
    /// Metric/log label for the terminal outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            PepError::Validation(_) => "invalid",
            PepError::Config(_) => "config_error",
            PepError::PolicyQuery(_) => "pdp_unavailable",
            PepError::DecisionIntegrity(_) => "integrity_error",
            PepError::Denied { .. } => "denied",
        }
    }

    pub fn terminal_stage(&self) -> Stage {
        match self {
            PepError::Denied { .. } => Stage::Denied,
            _ => Stage::Failed,
        }
    }
}

/// Proof that the PDP allowed this registration.
#[derive(Debug, Clone)]
pub struct AuthorizedRegistration {
    request: AuthorizationRequest,
}

impl AuthorizedRegistration {
    pub fn principal_id(&self) -> &str {
        &self.request.actor.principal_id
    }

    pub fn template(&self) -> &Template {
        self.request.template()
    }

    pub fn into_template(self) -> Template {
        self.request.into_template()
    }
}

/// Run one registration attempt from raw body bytes to a terminal outcome.
pub async fn evaluate(
    body: &[u8],
    metadata: &RequestMetadata,
    decision_point: &dyn DecisionPoint,
    cancel: &CancellationToken,
) -> Result<AuthorizedRegistration, PepError> {
    let outcome = run_stages(body, metadata, decision_point, cancel).await;
    match &outcome {
        Ok(authorized) => {
            metrics::counter!("tollgate_decisions_total", "outcome" => "allowed").increment(1);
            tracing::info!(
                stage = %Stage::Allowed,
                template_id = %authorized.template().id,
                principal_id = %authorized.principal_id(),
                "template registration allowed"
            );
        }
        Err(err) => {
            metrics::counter!("tollgate_decisions_total", "outcome" => err.outcome()).increment(1);
            match err {
                PepError::Validation(issues) => tracing::info!(
                    stage = %err.terminal_stage(),
                    outcome = err.outcome(),
                    issues = issues.issues().len(),
                    "template rejected by schema"
                ),
                PepError::Denied { reasons } => tracing::info!(
                    stage = %err.terminal_stage(),
                    outcome = err.outcome(),
                    reasons = ?reasons,
                    "template registration denied"
                ),
                _ => tracing::error!(
                    stage = %err.terminal_stage(),
                    outcome = err.outcome(),
                    error = %err,
                    "template registration failed closed"
                ),
            }
        }
    }
    outcome
}

async fn run_stages(
    body: &[u8],
    metadata: &RequestMetadata,
    decision_point: &dyn DecisionPoint,
    cancel: &CancellationToken,
) -> Result<AuthorizedRegistration, PepError> {
    tracing::debug!(stage = %Stage::Received, bytes = body.len());
    let payload = parse_payload(body).map_err(PepError::Validation)?;
    let template = validate_template(&payload).map_err(PepError::Validation)?;
    tracing::debug!(stage = %Stage::Validated, template_id = %template.id);

    let request = build_authorization_request(template, metadata);
    tracing::debug!(
        stage = %Stage::ContextBuilt,
        principal_id = %request.actor.principal_id,
        roles = request.actor.roles.len()
    );

    tracing::debug!(stage = %Stage::DecisionRequested);
    let response = decision_point.query(&request, cancel).await?;
    tracing::debug!(stage = %Stage::DecisionReceived);

    match enforce(&response)? {
        Verdict::Proceed => Ok(AuthorizedRegistration { request }),
        Verdict::Deny { reasons } => Err(PepError::Denied { reasons }),
    }
}
