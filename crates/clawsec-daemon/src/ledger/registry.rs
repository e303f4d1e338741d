use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::schema::LedgerSection;

use super::profile::SecurityProfile;

/// Process-wide agent → profile map.
#[derive(Debug)]
pub struct RiskLedger {
    isolation_threshold: f64,
    penalty_weight: f64,
    profiles: DashMap<String, Arc<Mutex<SecurityProfile>>>,
}

impl RiskLedger {
    pub fn new(cfg: &LedgerSection) -> Self {
        Self {
            isolation_threshold: cfg.isolation_threshold,
            penalty_weight: cfg.penalty_weight,
            profiles: DashMap::new(),
        }
    }

    /// Weight applied per rejection when the caller does not pick one.
    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// Existing profile handle, or a fresh zeroed one.
    pub fn get_or_create(&self, agent_id: &str) -> Arc<Mutex<SecurityProfile>> {
        if let Some(p) = self.profiles.get(agent_id) {
            return Arc::clone(p.value());
        }
        let entry = self
            .profiles
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SecurityProfile::new(agent_id))));
        Arc::clone(entry.value())
    }

    /// Lock an agent's profile for a full check → inspect → penalize sequence.
    pub async fn lease(&self, agent_id: &str) -> AgentLease {
        let handle = self.get_or_create(agent_id);
        AgentLease {
            guard: handle.lock_owned().await,
            isolation_threshold: self.isolation_threshold,
        }
    }

    /// Record one violation; returns the new risk score.
    pub async fn penalize(&self, agent_id: &str, reason: &str, weight: f64) -> f64 {
        self.lease(agent_id).await.penalize(reason, weight)
    }

    /// Whether the agent's score is above the isolation threshold.
    /// Unknown agents are not isolated (and are not created).
    pub async fn is_isolated(&self, agent_id: &str) -> bool {
        let Some(handle) = self.profiles.get(agent_id).map(|p| Arc::clone(p.value())) else {
            return false;
        };
        let profile = handle.lock().await;
        profile.exceeds(self.isolation_threshold)
    }

    /// Cloned profile, if the agent has been seen.
    pub async fn snapshot(&self, agent_id: &str) -> Option<SecurityProfile> {
        let handle = self.profiles.get(agent_id).map(|p| Arc::clone(p.value()))?;
        let profile = handle.lock().await;
        Some(profile.clone())
    }

    /// Number of agents with a profile.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Agents currently above the isolation threshold.
    pub async fn isolated_agents(&self) -> Vec<String> {
        let handles: Vec<_> = self.profiles.iter().map(|p| Arc::clone(p.value())).collect();
        let mut out = Vec::new();
        for handle in handles {
            let profile = handle.lock().await;
            if profile.exceeds(self.isolation_threshold) {
                out.push(profile.agent_id.clone());
            }
        }
        out.sort();
        out
    }
}

/// Exclusive access to one agent's profile.
pub struct AgentLease {
    guard: OwnedMutexGuard<SecurityProfile>,
    isolation_threshold: f64,
}

impl AgentLease {
    pub fn profile(&self) -> &SecurityProfile {
        &self.guard
    }

    pub fn is_isolated(&self) -> bool {
        self.guard.exceeds(self.isolation_threshold)
    }

    /// Record one violation; returns the new risk score.
    pub fn penalize(&mut self, reason: &str, weight: f64) -> f64 {
        let was_isolated = self.is_isolated();
        self.guard.apply_penalty(reason, weight, Utc::now());

        let profile = &*self.guard;
        tracing::warn!(
            agent = %profile.agent_id,
            reason,
            risk_score = profile.risk_score,
            blocked = profile.blocked_requests,
            "agent penalized"
        );
        if profile.exceeds(self.isolation_threshold) && !was_isolated {
            tracing::error!(
                agent = %profile.agent_id,
                risk_score = profile.risk_score,
                threshold = self.isolation_threshold,
                "agent exceeded risk threshold, isolating"
            );
        }
        profile.risk_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> RiskLedger {
        RiskLedger::new(&LedgerSection::default())
    }

    #[tokio::test]
    async fn profiles_are_created_lazily() {
        let l = ledger();
        assert!(l.is_empty());
        assert!(!l.is_isolated("CORE_a").await);
        assert!(l.snapshot("CORE_a").await.is_none());
        assert!(l.is_empty());

        let h = l.get_or_create("CORE_a");
        assert_eq!(h.lock().await.risk_score, 0.0);
        assert!(Arc::ptr_eq(&h, &l.get_or_create("CORE_a")));
        assert_eq!(l.len(), 1);
    }

    #[tokio::test]
    async fn six_default_penalties_isolate() {
        let l = ledger();
        for i in 0..6 {
            assert!(!l.is_isolated("CORE_a").await, "isolated too early at {i}");
            l.penalize("CORE_a", "ERR_MALFORMED_JSON", l.penalty_weight()).await;
        }
        let p = l.snapshot("CORE_a").await.expect("profile exists");
        assert_eq!(p.risk_score, 60.0);
        assert_eq!(p.blocked_requests, 6);
        assert!(l.is_isolated("CORE_a").await);
        assert_eq!(l.isolated_agents().await, vec!["CORE_a".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_penalties_are_not_lost() {
        let l = Arc::new(ledger());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let l = Arc::clone(&l);
            tasks.spawn(async move {
                l.penalize("CORE_busy", "ERR_MALFORMED_JSON", 1.0).await;
            });
        }
        while tasks.join_next().await.is_some() {}

        let p = l.snapshot("CORE_busy").await.expect("profile exists");
        assert_eq!(p.blocked_requests, 32);
        assert_eq!(p.violation_history.len(), 32);
        assert_eq!(p.risk_score, 32.0);
    }
}
