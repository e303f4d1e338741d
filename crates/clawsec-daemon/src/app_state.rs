//! Shared application state for the ClawSec daemon.
//!
//! Built once at startup; startup errors are explicit (Result instead of panic).

use std::sync::Arc;

use clawsec_core::error::Result;
use clawsec_core::{Inspect, PayloadInspector};

use crate::config::DaemonConfig;
use crate::ledger::RiskLedger;
use crate::obs::DaemonMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: DaemonConfig,
    inspector: Arc<dyn Inspect>,
    ledger: RiskLedger,
    metrics: DaemonMetrics,
}

impl AppState {
    /// Build state with the built-in payload inspector.
    pub fn new(cfg: DaemonConfig) -> Result<Self> {
        let inspector = PayloadInspector::new(cfg.inspector.to_inspector_config())?;
        Ok(Self::with_inspector(cfg, Arc::new(inspector)))
    }

    /// Build state around a caller-provided inspector.
    pub fn with_inspector(cfg: DaemonConfig, inspector: Arc<dyn Inspect>) -> Self {
        let ledger = RiskLedger::new(&cfg.ledger);
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                inspector,
                ledger,
                metrics: DaemonMetrics::default(),
            }),
        }
    }

    pub fn cfg(&self) -> &DaemonConfig {
        &self.inner.cfg
    }

    pub fn inspector(&self) -> Arc<dyn Inspect> {
        Arc::clone(&self.inner.inspector)
    }

    pub fn ledger(&self) -> &RiskLedger {
        &self.inner.ledger
    }

    pub fn metrics(&self) -> &DaemonMetrics {
        &self.inner.metrics
    }
}
