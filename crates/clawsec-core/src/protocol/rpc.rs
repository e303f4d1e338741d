//! JSON-RPC 2.0 request projection and the daemon's fixed responses.
//!
//! Requests are projected into [`RpcRequest`] once structural validation has
//! passed, so later pipeline stages work with typed fields instead of an
//! untyped map. Responses serialize with a stable field order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version string carried in every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Result string acknowledging a clean payload.
pub const ACK_CLEAN: &str = "ACK_CLEAN";

/// Message returned to isolated agents.
pub const AGENT_ISOLATED_MESSAGE: &str = "AGENT_ISOLATED_BY_CLAWSEC";

/// Prefix of every rejection message.
pub const INTERVENTION_PREFIX: &str = "ClawSec Intervention: ";

/// Typed JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version as sent by the caller (not enforced).
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Parameters; absent params read as an empty object.
    #[serde(default = "empty_params")]
    pub params: Value,
    /// Optional request id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response (exactly one per connection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// `{"jsonrpc":"2.0","result":"ACK_CLEAN"}`
    pub fn ack_clean() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: Some(ACK_CLEAN.into()),
            error: None,
        }
    }

    /// Policy rejection embedding the wire reason.
    pub fn rejection(code: i64, reason: &str) -> Self {
        Self::error(code, format!("{INTERVENTION_PREFIX}{reason}"))
    }

    /// Fixed isolation response; carries no content feedback.
    pub fn isolated(code: i64) -> Self {
        Self::error(code, AGENT_ISOLATED_MESSAGE.into())
    }

    fn error(code: i64, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: None,
            error: Some(RpcError { code, message }),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.error.is_none() && self.result.as_deref() == Some(ACK_CLEAN)
    }

    /// Serialize for the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        // A struct of strings and integers cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn responses_match_wire_literals() {
        assert_eq!(
            RpcResponse::ack_clean().to_bytes(),
            br#"{"jsonrpc":"2.0","result":"ACK_CLEAN"}"#.to_vec()
        );
        assert_eq!(
            RpcResponse::isolated(-32000).to_bytes(),
            br#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"AGENT_ISOLATED_BY_CLAWSEC"}}"#
                .to_vec()
        );
        assert_eq!(
            RpcResponse::rejection(-32600, "ERR_MALFORMED_JSON").to_bytes(),
            br#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"ClawSec Intervention: ERR_MALFORMED_JSON"}}"#
                .to_vec()
        );
    }

    #[test]
    fn missing_params_default_to_empty_object() {
        let req: RpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert_eq!(req.params, Value::Object(Map::new()));
        assert!(req.id.is_none());
    }
}
