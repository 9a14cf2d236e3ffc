// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(Default)]
struct DiscoveryMetricsInner {
    runs_started: AtomicU64,
    runs_succeeded: AtomicU64,
    runs_failed: AtomicU64,
    runs_cancelled: AtomicU64,
    probes: AtomicU64,
    probes_positive: AtomicU64,
    probe_errors: AtomicU64,
    probe_latency_total_ns: AtomicU64,
    probe_latency_samples: AtomicU64,
    probe_latency_max_ns: AtomicU64,
}

/// Shared counters for discovery runs. Cloning shares the underlying counters.
#[derive(Clone, Default)]
pub struct DiscoveryMetrics {
    inner: Arc<DiscoveryMetricsInner>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscoveryMetricsSnapshot {
    pub runs_started: u64,
    pub runs_succeeded: u64,
    pub runs_failed: u64,
    pub runs_cancelled: u64,
    pub probes: u64,
    pub probes_positive: u64,
    pub probe_errors: u64,
    pub probe_latency_ms_avg: f64,
    pub probe_latency_ms_max: f64,
}

impl DiscoveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_started(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_succeeded(&self) {
        self.inner.runs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.inner.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_cancelled(&self) {
        self.inner.runs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe(&self, has_data: bool, elapsed: Duration) {
        self.inner.probes.fetch_add(1, Ordering::Relaxed);
        if has_data {
            self.inner.probes_positive.fetch_add(1, Ordering::Relaxed);
        }
        self.observe_latency(elapsed);
    }

    pub fn record_probe_error(&self, elapsed: Duration) {
        self.inner.probes.fetch_add(1, Ordering::Relaxed);
        self.inner.probe_errors.fetch_add(1, Ordering::Relaxed);
        self.observe_latency(elapsed);
    }

    pub fn snapshot(&self) -> DiscoveryMetricsSnapshot {
        let total_ns = self.inner.probe_latency_total_ns.load(Ordering::Relaxed);
        let samples = self.inner.probe_latency_samples.load(Ordering::Relaxed);
        let max_ns = self.inner.probe_latency_max_ns.load(Ordering::Relaxed);
        let avg_ms = if samples > 0 {
            (total_ns as f64 / samples as f64) / 1_000_000.0
        } else {
            0.0
        };
        DiscoveryMetricsSnapshot {
            runs_started: self.inner.runs_started.load(Ordering::Relaxed),
            runs_succeeded: self.inner.runs_succeeded.load(Ordering::Relaxed),
            runs_failed: self.inner.runs_failed.load(Ordering::Relaxed),
            runs_cancelled: self.inner.runs_cancelled.load(Ordering::Relaxed),
            probes: self.inner.probes.load(Ordering::Relaxed),
            probes_positive: self.inner.probes_positive.load(Ordering::Relaxed),
            probe_errors: self.inner.probe_errors.load(Ordering::Relaxed),
            probe_latency_ms_avg: avg_ms,
            probe_latency_ms_max: max_ns as f64 / 1_000_000.0,
        }
    }

    fn observe_latency(&self, elapsed: Duration) {
        let nanos = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        self.inner
            .probe_latency_total_ns
            .fetch_add(nanos, Ordering::Relaxed);
        self.inner
            .probe_latency_samples
            .fetch_add(1, Ordering::Relaxed);
        self.inner
            .probe_latency_max_ns
            .fetch_max(nanos, Ordering::Relaxed);
    }
}
