//! Daemon config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use clawsec_core::error::{ClawSecError, Result};

pub use schema::{DaemonConfig, DaemonSection, InspectorSection, LedgerSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<DaemonConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ClawSecError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

/// Load `path` when it exists, otherwise fall back to built-in defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<DaemonConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        return Ok(DaemonConfig::default());
    }
    load_from_file(path)
}

pub fn load_from_str(s: &str) -> Result<DaemonConfig> {
    let cfg: DaemonConfig = serde_yaml::from_str(s)
        .map_err(|e| ClawSecError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
