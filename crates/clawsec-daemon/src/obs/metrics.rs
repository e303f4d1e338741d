//! Metrics registry for the daemon.
//!
//! Labels are flattened into sorted key vectors to keep deterministic
//! ordering. Histogram buckets are fixed in microseconds to avoid floating
//! point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge\n{} {}", name, name, self.get());
    }
}

// 10us .. 100ms; inspection is CPU-bound and should sit in the low buckets
const BUCKETS_MICROS: [u64; 8] = [10, 50, 100, 500, 1_000, 5_000, 10_000, 100_000];

#[derive(Default)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 8],
}

impl Histogram {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            let n = self.buckets[i].load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{le=\"{}\"}} {}", name, le, n);
        }
        let count = self.count();
        let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", name, count);
        let _ = writeln!(out, "{}_sum {}", name, self.sum.load(Ordering::Relaxed));
        let _ = writeln!(out, "{}_count {}", name, count);
    }
}

#[derive(Default)]
pub struct DaemonMetrics {
    pub connections_accepted: CounterVec,
    pub connections_inflight: Gauge,
    /// Labeled by `code` (client code or `ACCEPTED`).
    pub verdicts: CounterVec,
    pub isolation_short_circuits: CounterVec,
    /// Labeled by `kind`.
    pub handler_errors: CounterVec,
    pub inspect_duration: Histogram,
    draining: AtomicBool,
}

impl DaemonMetrics {
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Render all registered metrics plus any extra lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.connections_accepted.render("clawsec_connections_total", &mut out);
        self.connections_inflight.render("clawsec_connections_inflight", &mut out);
        self.verdicts.render("clawsec_verdicts_total", &mut out);
        self.isolation_short_circuits.render("clawsec_isolation_rejections_total", &mut out);
        self.handler_errors.render("clawsec_handler_errors_total", &mut out);
        self.inspect_duration.render("clawsec_inspect_duration_micros", &mut out);

        let _ = writeln!(
            out,
            "# TYPE clawsec_draining gauge\nclawsec_draining {}",
            if self.is_draining() { 1 } else { 0 }
        );
        for (k, v) in extra {
            let _ = writeln!(out, "{} {}", k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_keyed_by_sorted_labels() {
        let m = DaemonMetrics::default();
        m.verdicts.inc(&[("code", "ACCEPTED")]);
        m.verdicts.inc(&[("code", "ACCEPTED")]);
        m.handler_errors.inc(&[("kind", "io"), ("agent", "x")]);
        assert_eq!(m.verdicts.get(&[("code", "ACCEPTED")]), 2);
        assert_eq!(m.handler_errors.get(&[("agent", "x"), ("kind", "io")]), 1);
        assert_eq!(m.verdicts.get(&[("code", "MALFORMED_JSON")]), 0);
    }

    #[test]
    fn render_includes_every_family() {
        let m = DaemonMetrics::default();
        m.connections_accepted.inc(&[]);
        m.inspect_duration.observe(Duration::from_micros(40));
        m.set_draining();
        let text = m.render(&[("clawsec_agents_tracked", 3)]);
        assert!(text.contains("clawsec_connections_total{} 1"));
        assert!(text.contains("clawsec_inspect_duration_micros_bucket{le=\"10\"} 0"));
        assert!(text.contains("clawsec_inspect_duration_micros_bucket{le=\"50\"} 1"));
        assert!(text.contains("clawsec_inspect_duration_micros_count 1"));
        assert!(text.contains("clawsec_draining 1"));
        assert!(text.contains("clawsec_agents_tracked 3"));
    }
}
