//! Stateless payload inspection pipeline.
//!
//! A payload is classified by an ordered series of checks (size, encoding,
//! entropy, JSON-RPC shape, heuristic signatures, denylist, domain policy).
//! Each check assumes every earlier one passed; the first failure decides the
//! verdict.

pub mod entropy;
pub mod inspector;
pub mod signature;

use std::fmt;

use crate::error::ClientCode;

pub use inspector::{InspectorConfig, PayloadInspector};

/// Reason a payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    PayloadTooLarge,
    InvalidEncoding,
    HighEntropy,
    MalformedJson,
    InvalidRpcShape,
    /// Carries the name of the detector that fired.
    HeuristicSignatureMatch { detector: &'static str },
    /// Carries the denylisted token that was found.
    RestrictedToken { token: &'static str },
    LibraryFirstViolation,
}

impl RejectReason {
    pub fn client_code(self) -> ClientCode {
        match self {
            RejectReason::PayloadTooLarge => ClientCode::PayloadTooLarge,
            RejectReason::InvalidEncoding => ClientCode::InvalidEncoding,
            RejectReason::HighEntropy => ClientCode::HighEntropy,
            RejectReason::MalformedJson => ClientCode::MalformedJson,
            RejectReason::InvalidRpcShape => ClientCode::InvalidRpcShape,
            RejectReason::HeuristicSignatureMatch { .. } => ClientCode::HeuristicSignatureMatch,
            RejectReason::RestrictedToken { .. } => ClientCode::RestrictedToken,
            RejectReason::LibraryFirstViolation => ClientCode::LibraryFirstViolation,
        }
    }
}

/// Wire reason string embedded in rejection responses.
impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PayloadTooLarge => f.write_str("ERR_PAYLOAD_TOO_LARGE"),
            RejectReason::InvalidEncoding => f.write_str("ERR_INVALID_UTF8"),
            RejectReason::HighEntropy => f.write_str("ERR_HIGH_ENTROPY_DETECTED"),
            RejectReason::MalformedJson => f.write_str("ERR_MALFORMED_JSON"),
            RejectReason::InvalidRpcShape => f.write_str("ERR_INVALID_RPC_PROTOCOL"),
            RejectReason::HeuristicSignatureMatch { .. } => {
                f.write_str("ERR_HEURISTIC_SIGNATURE_MATCH")
            }
            RejectReason::RestrictedToken { token } => write!(f, "ERR_RESTRICTED_TOKEN: {token}"),
            RejectReason::LibraryFirstViolation => f.write_str("ERR_LIBRARY_FIRST_VIOLATION"),
        }
    }
}

/// Inspection outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Payload classifier seam used by the daemon.
pub trait Inspect: Send + Sync {
    fn inspect(&self, raw: &[u8]) -> Verdict;
}
