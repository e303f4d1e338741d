//! Protocol modules (IPC frame + JSON-RPC shapes).
//!
//! This module hosts the two layers of the daemon's wire format:
//! - Frame: an optional fixed-size, NUL-padded agent header ahead of the payload.
//! - RPC: JSON-RPC 2.0 request projection and the fixed response objects.
//!
//! All parsers are panic-free: a frame that does not carry a recognizable
//! header simply falls back to the shared placeholder identity, and the
//! payload itself is only ever interpreted by the inspector.

pub mod frame;
pub mod rpc;
