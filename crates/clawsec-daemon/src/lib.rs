//! ClawSec daemon library entry.
//!
//! This crate wires the Unix-socket transport, the risk ledger, and the core
//! payload inspector into the policy-enforcement daemon. It is intended to be
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod daemon;
pub mod ledger;
pub mod obs;
pub mod transport;

pub use daemon::PolicyDaemon;
