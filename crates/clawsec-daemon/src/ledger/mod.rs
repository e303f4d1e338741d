//! Risk accounting (per-agent security profiles, penalties, isolation).
//!
//! Profiles live for the daemon's lifetime; there is no decay, reset, or
//! persistence. Updates for one agent are serialized through a per-agent
//! async mutex so concurrent connections from the same agent cannot lose a
//! penalty.

pub mod profile;
pub mod registry;

pub use profile::{SecurityProfile, Violation};
pub use registry::{AgentLease, RiskLedger};
