use std::path::PathBuf;

use serde::Deserialize;

use clawsec_core::error::{ClawSecError, Result};
use clawsec_core::InspectorConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    pub version: u32,

    #[serde(default)]
    pub daemon: DaemonSection,

    #[serde(default)]
    pub inspector: InspectorSection,

    #[serde(default)]
    pub ledger: LedgerSection,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            version: 1,
            daemon: DaemonSection::default(),
            inspector: InspectorSection::default(),
            ledger: LedgerSection::default(),
        }
    }
}

impl DaemonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ClawSecError::UnsupportedVersion);
        }

        self.daemon.validate()?;
        self.inspector.validate()?;
        self.ledger.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            max_inflight: default_max_inflight(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl DaemonSection {
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ClawSecError::Config("daemon.socket_path must not be empty".into()));
        }
        if !(1..=4096).contains(&self.max_inflight) {
            return Err(ClawSecError::Config(
                "daemon.max_inflight must be between 1 and 4096".into(),
            ));
        }
        if !(100..=600_000).contains(&self.read_timeout_ms) {
            return Err(ClawSecError::Config(
                "daemon.read_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/clawsec_filter.sock")
}
fn default_max_inflight() -> usize {
    64
}
fn default_read_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectorSection {
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,
}

impl Default for InspectorSection {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
            entropy_threshold: default_entropy_threshold(),
        }
    }
}

impl InspectorSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=16 * 1024 * 1024).contains(&self.max_payload_bytes) {
            return Err(ClawSecError::Config(
                "inspector.max_payload_bytes must be between 1 and 16777216".into(),
            ));
        }
        if !(self.entropy_threshold > 0.0 && self.entropy_threshold <= 32.0) {
            return Err(ClawSecError::Config(
                "inspector.entropy_threshold must be in (0, 32]".into(),
            ));
        }
        Ok(())
    }

    pub fn to_inspector_config(&self) -> InspectorConfig {
        InspectorConfig {
            max_payload_bytes: self.max_payload_bytes,
            entropy_threshold: self.entropy_threshold,
        }
    }
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}
fn default_entropy_threshold() -> f64 {
    7.5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerSection {
    #[serde(default = "default_isolation_threshold")]
    pub isolation_threshold: f64,

    #[serde(default = "default_penalty_weight")]
    pub penalty_weight: f64,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            isolation_threshold: default_isolation_threshold(),
            penalty_weight: default_penalty_weight(),
        }
    }
}

impl LedgerSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.isolation_threshold.is_finite() && self.isolation_threshold > 0.0) {
            return Err(ClawSecError::Config(
                "ledger.isolation_threshold must be a positive number".into(),
            ));
        }
        if !(self.penalty_weight.is_finite() && self.penalty_weight > 0.0) {
            return Err(ClawSecError::Config(
                "ledger.penalty_weight must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

fn default_isolation_threshold() -> f64 {
    50.0
}
fn default_penalty_weight() -> f64 {
    10.0
}
