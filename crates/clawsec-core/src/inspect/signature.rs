//! Heuristic detectors and the restricted-token denylist.
//!
//! Both operate on the lowercase canonical serialization of request params.
//! Order matters: the first detector (then the first token) that matches
//! names the rejection.

use regex::Regex;

use crate::error::{ClawSecError, Result};

/// Built-in heuristic detectors: `(name, pattern)`.
const HEURISTICS: [(&str, &str); 3] = [
    ("sql_meta", r"(%27)|(')|(--)|(%23)|(#)"),
    ("sql_statement", r"drop\s+table|insert\s+into|delete\s+from"),
    ("dangerous_call", r"\b(base64_decode|eval|exec|system|popen)\b"),
];

/// Forbidden automation / escape primitives.
pub const RESTRICTED_TOKENS: [&str; 11] = [
    "do shell script",
    "rm -rf",
    "mkfifo",
    "nc -e",
    "/bin/bash",
    "/bin/sh",
    "osascript -e",
    "tell application \"terminal\"",
    "tell application \"system events\"",
    "write to file",
    "open for access",
];

#[derive(Debug, Clone)]
struct Heuristic {
    name: &'static str,
    re: Regex,
}

/// Compiled heuristic detectors, evaluated in order.
#[derive(Debug, Clone)]
pub struct HeuristicSet {
    detectors: Vec<Heuristic>,
}

impl HeuristicSet {
    pub fn builtin() -> Result<Self> {
        let detectors = HEURISTICS
            .iter()
            .map(|&(name, pattern)| {
                Regex::new(pattern)
                    .map(|re| Heuristic { name, re })
                    .map_err(|e| ClawSecError::Internal(format!("heuristic {name}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { detectors })
    }

    /// Name of the first detector matching `canonical`.
    pub fn first_match(&self, canonical: &str) -> Option<&'static str> {
        self.detectors
            .iter()
            .find(|h| h.re.is_match(canonical))
            .map(|h| h.name)
    }
}

#[derive(Debug, Clone)]
struct DenyEntry {
    token: &'static str,
    // token as it appears inside a serialized JSON string
    needle: String,
}

/// Literal substring denylist.
#[derive(Debug, Clone)]
pub struct Denylist {
    entries: Vec<DenyEntry>,
}

impl Denylist {
    pub fn builtin() -> Result<Self> {
        let entries = RESTRICTED_TOKENS
            .iter()
            .map(|&token| -> Result<DenyEntry> {
                let quoted = serde_json::to_string(token)
                    .map_err(|e| ClawSecError::Internal(format!("denylist token: {e}")))?;
                let needle = quoted.trim_matches('"').to_lowercase();
                Ok(DenyEntry { token, needle })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// First token whose escaped form occurs in `canonical`.
    pub fn first_match(&self, canonical: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| canonical.contains(&e.needle))
            .map(|e| e.token)
    }
}
