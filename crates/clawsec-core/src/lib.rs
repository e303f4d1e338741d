//! ClawSec core: IPC frame parsing, JSON-RPC shapes, and the payload inspector.
//!
//! This crate defines the wire-level contracts, rejection taxonomy, and the
//! stateless inspection pipeline shared by the daemon and client tooling. It
//! intentionally carries no transport or runtime dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ClawSecError`/`Result` or as a
//! `Verdict` so the daemon never crashes on malformed or hostile payloads.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod inspect;
pub mod protocol;

/// Shared result type.
pub use error::{ClawSecError, Result};
pub use inspect::{Inspect, InspectorConfig, PayloadInspector, RejectReason, Verdict};
