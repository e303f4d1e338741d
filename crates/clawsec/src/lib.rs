//! Top-level facade crate for ClawSec.
//!
//! Re-exports the inspection core and the daemon library so users can depend on a single crate.

pub mod core {
    pub use clawsec_core::*;
}

pub mod daemon {
    pub use clawsec_daemon::*;
}
