use std::time::Duration;

use admitd_core::error::{AdmitError, Result};
use admitd_core::protocol::PolicyConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub store: StoreSection,

    /// Deployment default, used when a descriptor carries no `config`.
    #[serde(default)]
    pub policy: PolicySection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AdmitError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.store.validate()?;
        self.policy.validate()?;

        Ok(())
    }

    /// Override the listen port with the value of `PORT`, keeping the host.
    pub fn apply_port_override(&mut self, port: Option<String>) -> Result<()> {
        let Some(port) = port else { return Ok(()) };
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| AdmitError::BadRequest(format!("PORT must be a valid port: {port}")))?;
        let host = self
            .gateway
            .listen
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.gateway.listen = format!("{host}:{port}");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.shutdown_grace_ms > 120_000 {
            return Err(AdmitError::BadRequest(
                "gateway.shutdown_grace_ms must be at most 120000".into(),
            ));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8002".into()
}
fn default_shutdown_grace_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// Process-local counters. Only correct for a single gateway instance.
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Redis => "redis",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_store_url")]
    pub url: String,

    /// Upper bound for every store round-trip.
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5000).contains(&self.timeout_ms) {
            return Err(AdmitError::BadRequest(
                "store.timeout_ms must be between 1 and 5000".into(),
            ));
        }
        if self.backend == StoreBackend::Redis
            && !(self.url.starts_with("redis://") || self.url.starts_with("rediss://"))
        {
            return Err(AdmitError::BadRequest(format!(
                "store.url must be a redis:// or rediss:// url: {}",
                self.url
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".into()
}
fn default_store_timeout_ms() -> u64 {
    250
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,

    #[serde(default)]
    pub required_headers: Vec<String>,

    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    #[serde(default = "default_enable_diagnostics", alias = "enable_debug_headers")]
    pub enable_diagnostics: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        let p = PolicyConfig::default();
        Self {
            max_requests_per_minute: p.max_requests_per_minute,
            required_headers: p.required_headers,
            allowed_methods: p.allowed_methods,
            enable_diagnostics: p.enable_diagnostics,
        }
    }
}

impl PolicySection {
    pub fn validate(&self) -> Result<()> {
        if self.allowed_methods.is_empty() {
            return Err(AdmitError::BadRequest(
                "policy.allowed_methods must not be empty".into(),
            ));
        }
        if self.allowed_methods.iter().any(|m| m.trim().is_empty()) {
            return Err(AdmitError::BadRequest(
                "policy.allowed_methods must not contain empty entries".into(),
            ));
        }
        if self.required_headers.iter().any(|h| h.trim().is_empty()) {
            return Err(AdmitError::BadRequest(
                "policy.required_headers must not contain empty names".into(),
            ));
        }
        Ok(())
    }

    /// Build the read-only runtime policy.
    pub fn to_policy(&self) -> PolicyConfig {
        PolicyConfig {
            max_requests_per_minute: self.max_requests_per_minute,
            required_headers: self.required_headers.clone(),
            allowed_methods: self.allowed_methods.clone(),
            enable_diagnostics: self.enable_diagnostics,
        }
    }
}

fn default_max_requests_per_minute() -> u32 {
    PolicyConfig::default().max_requests_per_minute
}
fn default_allowed_methods() -> Vec<String> {
    PolicyConfig::default().allowed_methods
}
fn default_enable_diagnostics() -> bool {
    PolicyConfig::default().enable_diagnostics
}
