//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use admitd_core::error::{AdmitError, Result};

pub use schema::{GatewayConfig, GatewaySection, PolicySection, StoreBackend, StoreSection};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "ADMITD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "admitd.yaml";

/// Resolve the config path from `ADMITD_CONFIG`, falling back to `admitd.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AdmitError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| AdmitError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
