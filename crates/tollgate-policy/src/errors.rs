use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One schema violation: where it is and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// Non-empty, ordered list of schema violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template schema ({} issue(s))", .0.len())]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Wrap collected issues; `None` when there is nothing to report.
    pub fn from_vec(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self(issues))
        }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationIssue {
            path: path.into(),
            message: message.into(),
        }])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }
}

/// The PDP answered, but not in the shape we act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionIntegrityError {
    #[error("decision response is not an object (received {0})")]
    NotAnObject(&'static str),
    #[error("decision response has no `result`")]
    MissingResult,
    #[error("decision `result` is not an object (received {0})")]
    ResultNotObject(&'static str),
    #[error("decision has no `allow` flag")]
    MissingAllow,
    #[error("decision `allow` is not a boolean (received {0})")]
    AllowNotBoolean(&'static str),
    #[error("decision has no `reasons`")]
    MissingReasons,
    #[error("decision `reasons` is not an array (received {0})")]
    ReasonsNotArray(&'static str),
    #[error("decision reason {index} is not a string (received {received})")]
    ReasonNotString { index: usize, received: &'static str },
}
