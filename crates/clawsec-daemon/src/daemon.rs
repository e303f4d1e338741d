//! Policy daemon: per-connection orchestration and process lifecycle.
//!
//! Per connection:
//! 1. read the frame and extract the agent identity
//! 2. lease the agent's profile; isolated agents get the fixed isolation
//!    response and the inspector never runs
//! 3. inspect; a rejection penalizes the agent and answers with the reason
//! 4. write exactly one response and close
//!
//! Internal errors stop at the connection boundary: they are logged, the
//! connection closes, and nobody is penalized.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use clawsec_core::error::{ClawSecError, ClientCode, Result};
use clawsec_core::protocol::frame::{decode_frame, Frame};
use clawsec_core::protocol::rpc::RpcResponse;
use clawsec_core::{RejectReason, Verdict};

use crate::app_state::AppState;
use crate::ledger::RiskLedger;
use crate::obs::DaemonMetrics;
use crate::transport::codec::{frame_cap, read_frame, write_response};
use crate::transport::{serve, IpcListener};

pub struct PolicyDaemon {
    state: AppState,
}

impl PolicyDaemon {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn ledger(&self) -> &RiskLedger {
        self.state.ledger()
    }

    pub fn metrics(&self) -> &DaemonMetrics {
        self.state.metrics()
    }

    /// Bind the configured socket and serve until `shutdown` resolves.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let daemon_cfg = &self.state.cfg().daemon;
        let listener = IpcListener::bind(&daemon_cfg.socket_path)?;
        let max_inflight = daemon_cfg.max_inflight;
        tracing::info!(max_inflight, "policy enforcer active, awaiting payloads");
        serve(listener, self, max_inflight, shutdown).await
    }

    /// Handle one connection end to end. Never fails outward.
    pub async fn handle_connection<S>(&self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let metrics = self.metrics();
        metrics.connections_accepted.inc(&[]);
        let _inflight = InflightGuard::enter(metrics);

        if let Err(e) = self.process(&mut stream).await {
            let kind = match &e {
                ClawSecError::Timeout => "timeout",
                ClawSecError::Io(_) => "io",
                _ => "internal",
            };
            metrics.handler_errors.inc(&[("kind", kind)]);
            match e {
                ClawSecError::Timeout => tracing::warn!("read deadline elapsed, closing"),
                e => tracing::error!(error = %e, "error handling IPC connection"),
            }
        }

        let _ = stream.shutdown().await;
    }

    async fn process<S>(&self, stream: &mut S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let daemon_cfg = &self.state.cfg().daemon;
        let cap = frame_cap(self.state.cfg().inspector.max_payload_bytes);
        let deadline = Duration::from_millis(daemon_cfg.read_timeout_ms);

        let raw = read_frame(stream, cap, deadline).await?;
        if raw.is_empty() {
            tracing::debug!("empty frame, closing without response");
            return Ok(());
        }

        let frame = decode_frame(raw);
        let span = tracing::info_span!("conn", agent = %frame.agent_id, claimed = frame.claimed);
        let response = self.evaluate(&frame).instrument(span).await?;
        write_response(stream, &response).await
    }

    /// Isolation check → inspect → penalize, atomic per agent.
    ///
    /// Inspection is CPU-bound on payloads up to the size bound, so it runs
    /// on the blocking pool while the lease stays held.
    pub async fn evaluate(&self, frame: &Frame) -> Result<RpcResponse> {
        let metrics = self.metrics();
        let mut lease = self.ledger().lease(&frame.agent_id).await;

        if lease.is_isolated() {
            metrics.isolation_short_circuits.inc(&[]);
            metrics
                .verdicts
                .inc(&[("code", ClientCode::AgentIsolated.as_str())]);
            tracing::warn!(risk_score = lease.profile().risk_score, "isolated agent refused");
            return Ok(RpcResponse::isolated(ClientCode::AgentIsolated.rpc_code()));
        }

        let inspector = self.state.inspector();
        let payload = frame.payload.clone();
        let started = Instant::now();
        let verdict = tokio::task::spawn_blocking(move || inspector.inspect(&payload))
            .await
            .map_err(|e| ClawSecError::Internal(format!("inspection aborted: {e}")))?;
        metrics.inspect_duration.observe(started.elapsed());

        let response = match verdict {
            Verdict::Accepted => {
                metrics.verdicts.inc(&[("code", "ACCEPTED")]);
                tracing::info!("payload cleared");
                RpcResponse::ack_clean()
            }
            Verdict::Rejected(reason) => {
                let code = reason.client_code();
                metrics.verdicts.inc(&[("code", code.as_str())]);
                if let RejectReason::HeuristicSignatureMatch { detector } = reason {
                    tracing::debug!(detector, "heuristic signature matched");
                }
                let wire = reason.to_string();
                lease.penalize(&wire, self.ledger().penalty_weight());
                RpcResponse::rejection(code.rpc_code(), &wire)
            }
        };
        Ok(response)
    }
}

/// Keeps the in-flight gauge balanced even if a handler unwinds.
struct InflightGuard<'a> {
    metrics: &'a DaemonMetrics,
}

impl<'a> InflightGuard<'a> {
    fn enter(metrics: &'a DaemonMetrics) -> Self {
        metrics.connections_inflight.inc();
        Self { metrics }
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.connections_inflight.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use tokio::io::AsyncReadExt;

    use clawsec_core::protocol::frame::{encode_frame, UNKNOWN_AGENT};
    use clawsec_core::Inspect;

    use crate::config::DaemonConfig;

    /// Rejects everything as malformed and counts invocations.
    #[derive(Default)]
    struct CountingInspector {
        calls: AtomicUsize,
    }

    impl Inspect for CountingInspector {
        fn inspect(&self, _raw: &[u8]) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Verdict::Rejected(RejectReason::MalformedJson)
        }
    }

    struct PanickingInspector;

    impl Inspect for PanickingInspector {
        fn inspect(&self, _raw: &[u8]) -> Verdict {
            panic!("inspector bug")
        }
    }

    fn daemon_with(inspector: Arc<dyn Inspect>) -> PolicyDaemon {
        PolicyDaemon::new(AppState::with_inspector(DaemonConfig::default(), inspector))
    }

    fn claimed(agent: &str, body: &str) -> Frame {
        decode_frame(encode_frame(agent, body.as_bytes()).expect("frame"))
    }

    #[tokio::test]
    async fn isolated_agent_never_reaches_the_inspector() {
        let counting = Arc::new(CountingInspector::default());
        let daemon = daemon_with(counting.clone());
        let frame = claimed("CORE_rogue", "{}");

        for _ in 0..6 {
            let resp = daemon.evaluate(&frame).await.expect("evaluate");
            assert_eq!(resp.error.map(|e| e.code), Some(-32600));
        }
        assert_eq!(counting.calls.load(Ordering::SeqCst), 6);

        let profile = daemon.ledger().snapshot("CORE_rogue").await.expect("profile");
        assert_eq!(profile.risk_score, 60.0);
        assert!(daemon.ledger().is_isolated("CORE_rogue").await);

        let resp = daemon.evaluate(&frame).await.expect("evaluate");
        assert_eq!(resp, RpcResponse::isolated(-32000));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 6);
        // isolation responses do not add penalties
        let profile = daemon.ledger().snapshot("CORE_rogue").await.expect("profile");
        assert_eq!(profile.blocked_requests, 6);
        assert_eq!(daemon.metrics().isolation_short_circuits.get(&[]), 1);
    }

    #[tokio::test]
    async fn inspector_panic_closes_without_penalty() {
        let daemon = daemon_with(Arc::new(PanickingInspector));
        let frame = claimed("CORE_alpha", "{}");

        let err = daemon.evaluate(&frame).await.expect_err("must fail");
        assert!(matches!(err, ClawSecError::Internal(_)));

        let profile = daemon.ledger().snapshot("CORE_alpha").await.expect("profile");
        assert_eq!(profile.blocked_requests, 0);
        assert_eq!(profile.risk_score, 0.0);
        // the lease is released, so the agent can be served again
        assert!(!daemon.ledger().is_isolated("CORE_alpha").await);
    }

    #[tokio::test]
    async fn unclaimed_callers_share_one_profile() {
        let daemon = daemon_with(Arc::new(CountingInspector::default()));
        let a = decode_frame(Bytes::from_static(b"{\"from\":\"first caller\"}"));
        let mut foreign = b"EDGE_second".to_vec();
        foreign.resize(32, 0);
        foreign.extend_from_slice(b"{}");
        let b = decode_frame(Bytes::from(foreign));

        daemon.evaluate(&a).await.expect("evaluate");
        daemon.evaluate(&b).await.expect("evaluate");

        let shared = daemon.ledger().snapshot(UNKNOWN_AGENT).await.expect("profile");
        assert_eq!(shared.blocked_requests, 2);
        assert_eq!(shared.risk_score, 20.0);
        assert_eq!(daemon.ledger().len(), 1);
    }

    #[tokio::test]
    async fn handle_connection_writes_one_response() {
        let daemon = daemon_with(Arc::new(
            clawsec_core::PayloadInspector::new(Default::default()).expect("inspector"),
        ));
        let (mut client, server) = tokio::io::duplex(4096);

        let frame = encode_frame(
            "CORE_player",
            br#"{"jsonrpc":"2.0","method":"play_track","params":{"id":"i.98765"}}"#,
        )
        .expect("frame");
        client.write_all(&frame).await.expect("write");
        client.shutdown().await.expect("half-close");

        daemon.handle_connection(server).await;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.expect("read");
        assert_eq!(out, br#"{"jsonrpc":"2.0","result":"ACK_CLEAN"}"#.to_vec());
        assert_eq!(daemon.metrics().verdicts.get(&[("code", "ACCEPTED")]), 1);
        assert_eq!(daemon.metrics().connections_inflight.get(), 0);
    }

    #[tokio::test]
    async fn empty_frame_gets_no_response_and_no_penalty() {
        let daemon = daemon_with(Arc::new(CountingInspector::default()));
        let (mut client, server) = tokio::io::duplex(64);
        client.shutdown().await.expect("half-close");

        daemon.handle_connection(server).await;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.expect("read");
        assert!(out.is_empty());
        assert!(daemon.ledger().is_empty());
    }
}
