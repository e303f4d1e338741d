use chrono::{DateTime, Utc};

/// One timestamped entry of an agent's violation log.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub at: DateTime<Utc>,
    pub reason: String,
}

/// Mutable security state for one agent.
///
/// Invariant: `blocked_requests == violation_history.len()`, and
/// `risk_score` only moves through [`SecurityProfile::apply_penalty`].
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityProfile {
    pub agent_id: String,
    pub risk_score: f64,
    pub blocked_requests: u64,
    pub last_violation: Option<DateTime<Utc>>,
    pub violation_history: Vec<Violation>,
}

impl SecurityProfile {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            risk_score: 0.0,
            blocked_requests: 0,
            last_violation: None,
            violation_history: Vec::new(),
        }
    }

    /// Record a violation. Non-finite or negative weights count as zero so
    /// the score never decreases.
    pub(crate) fn apply_penalty(&mut self, reason: &str, weight: f64, at: DateTime<Utc>) {
        let weight = if weight.is_finite() && weight > 0.0 { weight } else { 0.0 };
        self.risk_score += weight;
        self.blocked_requests += 1;
        self.last_violation = Some(at);
        self.violation_history.push(Violation {
            at,
            reason: reason.to_string(),
        });
    }

    /// Strictly above `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.risk_score > threshold
    }
}
