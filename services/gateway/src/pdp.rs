//! Policy decision point client.
//!
//! # Purpose
//! Ships an [`AuthorizationRequest`] to the external PDP and returns the decoded
//! response body untouched, for the decision enforcer to judge.
//!
//! # Key invariants
//! - A missing endpoint is reported as [`ConfigError`] before any network I/O.
//! - Exactly one attempt per call. Retrying is a caller decision.
//! - The exchange is bounded by a deadline and can be cancelled by the caller.
//!
//! # Wire format
//! `POST <endpoint>` with body `{"input": <AuthorizationRequest>}` and
//! `content-type: application/json`. Any 2xx JSON body is returned as-is.
use crate::config::PdpConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tollgate_policy::AuthorizationRequest;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("policy decision point not configured")]
    MissingEndpoint,
}

/// Transport or availability failure while talking to the PDP.
#[derive(Debug, thiserror::Error)]
pub enum PolicyQueryError {
    #[error("policy decision point did not answer within {0:?}")]
    Timeout(Duration),
    #[error("policy query cancelled")]
    Cancelled,
    #[error("policy decision point transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("policy decision point returned status {0}")]
    Status(u16),
    #[error("policy decision point returned a non-JSON body: {0}")]
    MalformedBody(String),
}

impl PolicyQueryError {
    pub fn label(&self) -> &'static str {
        match self {
            PolicyQueryError::Timeout(_) => "timeout",
            PolicyQueryError::Cancelled => "cancelled",
            PolicyQueryError::Transport(_) => "transport",
            PolicyQueryError::Status(_) => "status",
            PolicyQueryError::MalformedBody(_) => "malformed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdpError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Query(#[from] PolicyQueryError),
}

/// Seam between the enforcement pipeline and whatever answers policy queries.
#[async_trait]
pub trait DecisionPoint: Send + Sync {
    /// Ask for a decision on `request`, returning the raw decoded response.
    async fn query(
        &self,
        request: &AuthorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, PdpError>;

    fn is_configured(&self) -> bool;
}

#[derive(Serialize)]
struct QueryEnvelope<'a> {
    input: &'a AuthorizationRequest,
}

/// HTTP client for an OPA-style decision endpoint.
#[derive(Debug, Clone)]
pub struct PolicyClient {
    client: reqwest::Client,
    endpoint: Option<Url>,
    timeout: Duration,
}

impl PolicyClient {
    /// Build a client from startup configuration.
    ///
    /// # Errors
    /// - The configured URL does not parse.
    /// - The HTTP client cannot be constructed.
    pub fn new(config: &PdpConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .url
            .as_deref()
            .map(|url| Url::parse(url).with_context(|| format!("parse pdp url: {url}")))
            .transpose()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .context("build pdp http client")?;
        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout(),
        })
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(
        &self,
        endpoint: &Url,
        request: &AuthorizationRequest,
    ) -> Result<Value, PolicyQueryError> {
        let response = self
            .client
            .post(endpoint.clone())
            .json(&QueryEnvelope { input: request })
            .send()
            .await
            .map_err(PolicyQueryError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolicyQueryError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(PolicyQueryError::Transport)?;
        serde_json::from_slice(&body).map_err(|err| PolicyQueryError::MalformedBody(err.to_string()))
    }
}

#[async_trait]
impl DecisionPoint for PolicyClient {
    async fn query(
        &self,
        request: &AuthorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, PdpError> {
        let endpoint = self.endpoint.as_ref().ok_or(ConfigError::MissingEndpoint)?;
        tracing::debug!(%endpoint, action = %request.action, "querying policy decision point");

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PolicyQueryError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.exchange(endpoint, request)) => {
                result.unwrap_or_else(|_| Err(PolicyQueryError::Timeout(self.timeout)))
            }
        };
        let label = match &outcome {
            Ok(_) => "ok",
            Err(err) => err.label(),
        };
        metrics::counter!("tollgate_pdp_requests_total", "outcome" => label).increment(1);
        metrics::histogram!("tollgate_pdp_request_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(body) => Ok(body),
            Err(err) => {
                tracing::warn!(error = %err, %endpoint, "policy query failed");
                Err(err.into())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tollgate_policy::{RequestMetadata, build_authorization_request, validate_template};

    fn request() -> AuthorizationRequest {
        let template = validate_template(&json!({
            "id": "tpl-1",
            "provenance": { "created_by": "alice" },
            "bindings": [],
            "lifecycle": { "transitions": [] },
            "spec": { "kind": "static" }
        }))
        .expect("valid");
        build_authorization_request(template, &RequestMetadata::default())
    }

    #[tokio::test]
    async fn missing_endpoint_is_config_error() {
        let client = PolicyClient::new(&PdpConfig::default()).expect("client");
        assert!(!client.is_configured());
        let err = client
            .query(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PdpError::Config(ConfigError::MissingEndpoint)));
    }

    #[test]
    fn invalid_url_is_rejected_at_construction() {
        let config = PdpConfig {
            url: Some("::not-a-url".to_string()),
            ..PdpConfig::default()
        };
        assert!(PolicyClient::new(&config).is_err());
    }

    #[test]
    fn envelope_wraps_request_as_input() {
        let request = request();
        let encoded = serde_json::to_value(QueryEnvelope { input: &request }).expect("encode");
        assert_eq!(encoded["input"]["action"], "register_template");
        assert_eq!(encoded["input"]["actor"]["principal_id"], "anonymous");
        assert_eq!(encoded["input"]["resource"]["id"], "tpl-1");
    }

    #[test]
    fn error_labels_are_distinct() {
        let labels = [
            PolicyQueryError::Timeout(Duration::from_millis(5)).label(),
            PolicyQueryError::Cancelled.label(),
            PolicyQueryError::Status(503).label(),
            PolicyQueryError::MalformedBody("eof".to_string()).label(),
        ];
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }
}
