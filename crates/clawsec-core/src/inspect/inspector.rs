//! Payload inspector: raw bytes in, [`Verdict`] out.

use serde_json::Value;

use super::entropy::shannon_entropy;
use super::signature::{Denylist, HeuristicSet};
use super::{Inspect, RejectReason, Verdict};
use crate::error::Result;
use crate::protocol::rpc::RpcRequest;

/// Method subject to the library-first rule.
pub const PLAY_TRACK_METHOD: &str = "play_track";

/// Prefix marking library-sourced track ids.
pub const LIBRARY_ID_PREFIX: &str = "i.";

/// Inspector thresholds.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Upper bound on payload length in bytes.
    pub max_payload_bytes: usize,
    /// Entropy (bits per symbol) above which a payload is rejected.
    pub entropy_threshold: f64,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024 * 1024,
            entropy_threshold: 7.5,
        }
    }
}

/// Stateless classification pipeline.
#[derive(Debug, Clone)]
pub struct PayloadInspector {
    cfg: InspectorConfig,
    heuristics: HeuristicSet,
    denylist: Denylist,
}

impl PayloadInspector {
    pub fn new(cfg: InspectorConfig) -> Result<Self> {
        Ok(Self {
            cfg,
            heuristics: HeuristicSet::builtin()?,
            denylist: Denylist::builtin()?,
        })
    }

    /// Run every check and return the typed request when all pass.
    pub fn classify(&self, raw: &[u8]) -> std::result::Result<RpcRequest, RejectReason> {
        if raw.len() > self.cfg.max_payload_bytes {
            return Err(RejectReason::PayloadTooLarge);
        }

        let text = std::str::from_utf8(raw).map_err(|_| RejectReason::InvalidEncoding)?;

        if shannon_entropy(text) > self.cfg.entropy_threshold {
            return Err(RejectReason::HighEntropy);
        }

        let req = parse_request(text)?;

        let canonical = serde_json::to_string(&req.params)
            .map_err(|_| RejectReason::MalformedJson)?
            .to_lowercase();

        if let Some(detector) = self.heuristics.first_match(&canonical) {
            return Err(RejectReason::HeuristicSignatureMatch { detector });
        }

        if let Some(token) = self.denylist.first_match(&canonical) {
            return Err(RejectReason::RestrictedToken { token });
        }

        check_library_first(&req)?;

        Ok(req)
    }
}

impl Inspect for PayloadInspector {
    fn inspect(&self, raw: &[u8]) -> Verdict {
        match self.classify(raw) {
            Ok(_) => Verdict::Accepted,
            Err(reason) => Verdict::Rejected(reason),
        }
    }
}

/// Parse then project into the typed request.
fn parse_request(text: &str) -> std::result::Result<RpcRequest, RejectReason> {
    let value: Value = serde_json::from_str(text).map_err(|_| RejectReason::MalformedJson)?;

    let Some(obj) = value.as_object() else {
        return Err(RejectReason::InvalidRpcShape);
    };
    if !obj.contains_key("method") || !obj.contains_key("jsonrpc") {
        return Err(RejectReason::InvalidRpcShape);
    }

    serde_json::from_value(value).map_err(|_| RejectReason::InvalidRpcShape)
}

fn check_library_first(req: &RpcRequest) -> std::result::Result<(), RejectReason> {
    if req.method != PLAY_TRACK_METHOD {
        return Ok(());
    }
    match req.params.get("id") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(id)) if id.is_empty() || id.starts_with(LIBRARY_ID_PREFIX) => Ok(()),
        Some(_) => Err(RejectReason::LibraryFirstViolation),
    }
}
