//! Transport layer (Unix domain socket).
//!
//! Exposes the listener with its bounded accept loop, the read-until-close
//! framing used per connection, and a small client for callers and tests.

pub mod client;
pub mod codec;
pub mod listener;

pub use listener::{serve, IpcListener};
