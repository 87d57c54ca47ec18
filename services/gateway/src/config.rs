use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_PDP_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PDP_CONNECT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// Gateway configuration sourced from environment variables, optionally
// overridden by a YAML file. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    // HTTP listener for the gated API.
    pub bind_addr: SocketAddr,
    // Prometheus listener.
    pub metrics_bind: SocketAddr,
    pub pdp: PdpConfig,
    // Largest request body the enforcement middleware will buffer.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdpConfig {
    // Decision endpoint; `None` leaves the gateway running but failing closed.
    pub url: Option<String>,
    // Deadline for the whole exchange, send through body read.
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: DEFAULT_PDP_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_PDP_CONNECT_TIMEOUT_MS,
        }
    }
}

impl PdpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
struct GatewayConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    pdp_url: Option<String>,
    pdp_timeout_ms: Option<u64>,
    pdp_connect_timeout_ms: Option<u64>,
    max_body_bytes: Option<usize>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("TOLLGATE_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse TOLLGATE_BIND")?;
        let metrics_bind = std::env::var("TOLLGATE_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse TOLLGATE_METRICS_BIND")?;
        // OPA_URL is accepted for deployments that already export it.
        let url = non_empty_var("TOLLGATE_PDP_URL").or_else(|| non_empty_var("OPA_URL"));
        let timeout_ms = env_or("TOLLGATE_PDP_TIMEOUT_MS", DEFAULT_PDP_TIMEOUT_MS)?;
        let connect_timeout_ms =
            env_or("TOLLGATE_PDP_CONNECT_TIMEOUT_MS", DEFAULT_PDP_CONNECT_TIMEOUT_MS)?;
        let max_body_bytes = env_or("TOLLGATE_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        Ok(Self {
            bind_addr,
            metrics_bind,
            pdp: PdpConfig {
                url,
                timeout_ms,
                connect_timeout_ms,
            },
            max_body_bytes,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("TOLLGATE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read TOLLGATE_CONFIG: {path}"))?;
            let override_cfg: GatewayConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse gateway config yaml")?;
            config.apply(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, override_cfg: GatewayConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.pdp_url {
            self.pdp.url = Some(value).filter(|url| !url.is_empty());
        }
        if let Some(value) = override_cfg.pdp_timeout_ms {
            self.pdp.timeout_ms = value;
        }
        if let Some(value) = override_cfg.pdp_connect_timeout_ms {
            self.pdp.connect_timeout_ms = value;
        }
        if let Some(value) = override_cfg.max_body_bytes {
            self.max_body_bytes = value;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.pdp.timeout_ms == 0 {
            anyhow::bail!("pdp timeout must be greater than zero");
        }
        if self.pdp.connect_timeout_ms == 0 {
            anyhow::bail!("pdp connect timeout must be greater than zero");
        }
        if let Some(url) = &self.pdp.url {
            reqwest::Url::parse(url).with_context(|| format!("parse pdp url: {url}"))?;
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
