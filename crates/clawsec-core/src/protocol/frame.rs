//! Agent frame parsing (panic-free).
//!
//! Layout: `[32-byte NUL-padded agent header][payload]`. The header is only
//! honored when the frame is longer than the header and the trimmed header
//! starts with [`AGENT_PREFIX`]; otherwise the whole frame is payload and the
//! caller collapses onto [`UNKNOWN_AGENT`].

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ClawSecError, Result};

/// Fixed agent header length in bytes.
pub const AGENT_HEADER_LEN: usize = 32;

/// Literal prefix an identity claim must carry.
pub const AGENT_PREFIX: &str = "CORE_";

/// Shared identity for every caller without a recognized header.
pub const UNKNOWN_AGENT: &str = "UNKNOWN_CORE";

/// Parsed IPC frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Agent identity (claimed or placeholder).
    pub agent_id: String,
    /// Whether the identity came from a recognized header.
    pub claimed: bool,
    /// Payload handed to the inspector (zero-copy).
    pub payload: Bytes,
}

/// Split a raw frame into agent identity and payload.
pub fn decode_frame(mut buf: Bytes) -> Frame {
    if buf.remaining() > AGENT_HEADER_LEN {
        if let Some(agent_id) = buf.get(..AGENT_HEADER_LEN).and_then(parse_header) {
            buf.advance(AGENT_HEADER_LEN);
            return Frame {
                agent_id,
                claimed: true,
                payload: buf,
            };
        }
    }

    Frame {
        agent_id: UNKNOWN_AGENT.to_string(),
        claimed: false,
        payload: buf,
    }
}

/// Decode a header, dropping undecodable bytes and surrounding NUL padding.
fn parse_header(header: &[u8]) -> Option<String> {
    let decoded: String = String::from_utf8_lossy(header)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect();
    let trimmed = decoded.trim_matches('\0');
    trimmed
        .starts_with(AGENT_PREFIX)
        .then(|| trimmed.to_string())
}

/// Build a frame carrying `agent_id` in a NUL-padded header.
pub fn encode_frame(agent_id: &str, payload: &[u8]) -> Result<Bytes> {
    if !agent_id.starts_with(AGENT_PREFIX) {
        return Err(ClawSecError::BadRequest(format!(
            "agent id must start with {AGENT_PREFIX}: {agent_id}"
        )));
    }
    if agent_id.len() > AGENT_HEADER_LEN {
        return Err(ClawSecError::BadRequest(format!(
            "agent id exceeds {AGENT_HEADER_LEN} bytes"
        )));
    }
    if agent_id.contains('\0') {
        return Err(ClawSecError::BadRequest("agent id must not contain NUL".into()));
    }

    let mut out = BytesMut::with_capacity(AGENT_HEADER_LEN + payload.len());
    out.put_slice(agent_id.as_bytes());
    out.put_bytes(0, AGENT_HEADER_LEN - agent_id.len());
    out.put_slice(payload);
    Ok(out.freeze())
}
