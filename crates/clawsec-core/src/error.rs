//! Shared error type across ClawSec crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCode {
    /// Payload exceeds the configured size bound.
    PayloadTooLarge,
    /// Payload is not valid UTF-8.
    InvalidEncoding,
    /// Payload text looks compressed, encrypted, or obfuscated.
    HighEntropy,
    /// Payload is not parseable JSON.
    MalformedJson,
    /// JSON is not a JSON-RPC request object.
    InvalidRpcShape,
    /// Params matched a heuristic injection detector.
    HeuristicSignatureMatch,
    /// Params carry a denylisted automation/escape primitive.
    RestrictedToken,
    /// `play_track` id is not library-sourced.
    LibraryFirstViolation,
    /// Caller is isolated; content is not inspected.
    AgentIsolated,
    /// Internal daemon failure.
    InternalError,
}

impl ClientCode {
    /// Stable identifier used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::InvalidEncoding => "INVALID_ENCODING",
            ClientCode::HighEntropy => "HIGH_ENTROPY",
            ClientCode::MalformedJson => "MALFORMED_JSON",
            ClientCode::InvalidRpcShape => "INVALID_RPC_SHAPE",
            ClientCode::HeuristicSignatureMatch => "HEURISTIC_SIGNATURE_MATCH",
            ClientCode::RestrictedToken => "RESTRICTED_TOKEN",
            ClientCode::LibraryFirstViolation => "LIBRARY_FIRST_VIOLATION",
            ClientCode::AgentIsolated => "AGENT_ISOLATED",
            ClientCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// JSON-RPC error code carried in the response object.
    pub fn rpc_code(self) -> i64 {
        match self {
            ClientCode::AgentIsolated => -32000,
            _ => -32600,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ClawSecError>;

/// Unified error type used by core and daemon.
#[derive(Debug, Error)]
pub enum ClawSecError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("read deadline elapsed")]
    Timeout,
    #[error("internal: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_isolation_leaves_the_invalid_request_code() {
        assert_eq!(ClientCode::AgentIsolated.rpc_code(), -32000);
        for code in [
            ClientCode::PayloadTooLarge,
            ClientCode::HighEntropy,
            ClientCode::RestrictedToken,
            ClientCode::LibraryFirstViolation,
        ] {
            assert_eq!(code.rpc_code(), -32600, "{}", code.as_str());
        }
    }
}
