//! Decision shape checks and enforcement.
//!
//! # Purpose
//! Interprets the raw PDP response. Only a response of the exact shape
//! `{"result": {"allow": <bool>, "reasons": [<string>...]}}` is acted on.
//!
//! # Key invariants
//! - Fail closed: anything other than a well-formed `allow: true` never yields
//!   [`Verdict::Proceed`].
//! - A shape violation is a [`DecisionIntegrityError`], distinct from a denial.
//! - Denial reasons are passed through verbatim and in order.
use crate::errors::DecisionIntegrityError;
use crate::schema::kind_of;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allow: bool,
    pub reasons: Vec<String>,
}

/// What the gateway does with a well-formed decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Deny { reasons: Vec<String> },
}

impl Decision {
    pub fn verdict(self) -> Verdict {
        if self.allow {
            Verdict::Proceed
        } else {
            Verdict::Deny {
                reasons: self.reasons,
            }
        }
    }
}

/// Check the envelope and decision fields of a PDP response.
///
/// # Errors
/// - [`DecisionIntegrityError`] naming the first contract violation.
pub fn parse_decision(response: &Value) -> Result<Decision, DecisionIntegrityError> {
    let envelope = response
        .as_object()
        .ok_or(DecisionIntegrityError::NotAnObject(kind_of(response)))?;
    let result = envelope
        .get("result")
        .ok_or(DecisionIntegrityError::MissingResult)?;
    let result = result
        .as_object()
        .ok_or(DecisionIntegrityError::ResultNotObject(kind_of(result)))?;

    let allow = match result.get("allow") {
        None => return Err(DecisionIntegrityError::MissingAllow),
        Some(Value::Bool(allow)) => *allow,
        Some(other) => return Err(DecisionIntegrityError::AllowNotBoolean(kind_of(other))),
    };

    let reasons = match result.get("reasons") {
        None => return Err(DecisionIntegrityError::MissingReasons),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(DecisionIntegrityError::ReasonsNotArray(kind_of(other))),
    };
    let reasons = reasons
        .iter()
        .enumerate()
        .map(|(index, reason)| match reason {
            Value::String(text) => Ok(text.clone()),
            other => Err(DecisionIntegrityError::ReasonNotString {
                index,
                received: kind_of(other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Decision { allow, reasons })
}

/// Validate a raw PDP response and turn it into a verdict.
pub fn enforce(response: &Value) -> Result<Verdict, DecisionIntegrityError> {
    parse_decision(response).map(Decision::verdict)
}
