//! Lightweight in-process metrics.
//!
//! Counters, gauges, and a latency histogram stored as atomics behind
//! `DashMap` label sets. The daemon has no HTTP surface, so the registry is
//! rendered in Prometheus text format and logged when the daemon drains.

pub mod metrics;

pub use metrics::DaemonMetrics;
