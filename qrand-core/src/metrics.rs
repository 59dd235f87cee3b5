// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Metrics collection and reporting

use crate::config::Backend;
use crate::generator::Generation;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Service-wide counters; cheap to clone
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,

    // Request metrics
    requests_total: AtomicU64,
    requests_rejected: AtomicU64,
    requests_failed: AtomicU64,
    bits_generated: AtomicU64,
    bytes_served: AtomicU64,

    // Backend metrics
    simulator_generations: AtomicU64,
    hardware_generations: AtomicU64,
    hardware_fallbacks: AtomicU64,

    // Latency tracking (microseconds)
    request_latencies: RwLock<Vec<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                requests_total: AtomicU64::new(0),
                requests_rejected: AtomicU64::new(0),
                requests_failed: AtomicU64::new(0),
                bits_generated: AtomicU64::new(0),
                bytes_served: AtomicU64::new(0),
                simulator_generations: AtomicU64::new(0),
                hardware_generations: AtomicU64::new(0),
                hardware_fallbacks: AtomicU64::new(0),
                request_latencies: RwLock::new(Vec::with_capacity(MAX_LATENCY_SAMPLES)),
            }),
        }
    }

    /// Record a successful generation
    pub fn record_generation(&self, generation: &Generation, latency_micros: u64) {
        let inner = &self.inner;
        inner.requests_total.fetch_add(1, Ordering::Relaxed);
        inner
            .bits_generated
            .fetch_add(generation.n_bits as u64, Ordering::Relaxed);
        inner
            .bytes_served
            .fetch_add(generation.bytes.len() as u64, Ordering::Relaxed);

        match generation.backend {
            Backend::Simulator => inner.simulator_generations.fetch_add(1, Ordering::Relaxed),
            Backend::Hardware => inner.hardware_generations.fetch_add(1, Ordering::Relaxed),
        };
        if generation.fell_back() {
            inner.hardware_fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = inner.request_latencies.write();
        latencies.push(latency_micros);
        if latencies.len() > MAX_LATENCY_SAMPLES {
            latencies.drain(0..MAX_LATENCY_SAMPLES / 2);
        }
    }

    /// Validation or authentication failure
    pub fn record_rejection(&self) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        self.inner.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Generation error surfaced as 500
    pub fn record_failure(&self) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        self.inner.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.inner.requests_total.load(Ordering::Relaxed)
    }

    pub fn requests_rejected(&self) -> u64 {
        self.inner.requests_rejected.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.inner.requests_failed.load(Ordering::Relaxed)
    }

    pub fn bits_generated(&self) -> u64 {
        self.inner.bits_generated.load(Ordering::Relaxed)
    }

    pub fn bytes_served(&self) -> u64 {
        self.inner.bytes_served.load(Ordering::Relaxed)
    }

    pub fn simulator_generations(&self) -> u64 {
        self.inner.simulator_generations.load(Ordering::Relaxed)
    }

    pub fn hardware_generations(&self) -> u64 {
        self.inner.hardware_generations.load(Ordering::Relaxed)
    }

    pub fn hardware_fallbacks(&self) -> u64 {
        self.inner.hardware_fallbacks.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    pub fn latency_percentile(&self, percentile: f64) -> Option<u64> {
        let latencies = self.inner.request_latencies.read();
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let index = ((sorted.len() as f64 * percentile).ceil() as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }

    /// Generate Prometheus-compatible metrics output
    pub fn prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters = [
            ("qrand_requests_total", "Total number of bit requests", self.requests_total()),
            ("qrand_requests_rejected", "Requests rejected by validation or authentication", self.requests_rejected()),
            ("qrand_requests_failed", "Requests that failed during generation", self.requests_failed()),
            ("qrand_bits_generated", "Total bits generated", self.bits_generated()),
            ("qrand_bytes_served", "Total bytes served", self.bytes_served()),
            ("qrand_simulator_generations", "Requests served by the simulator", self.simulator_generations()),
            ("qrand_hardware_generations", "Requests served by the quantum device", self.hardware_generations()),
            ("qrand_hardware_fallbacks", "Hardware failures recovered by the simulator", self.hardware_fallbacks()),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        output.push_str("# HELP qrand_uptime_seconds Service uptime in seconds\n");
        output.push_str("# TYPE qrand_uptime_seconds gauge\n");
        output.push_str(&format!("qrand_uptime_seconds {}\n", self.uptime_seconds()));

        for (label, percentile) in [("p50", 0.50), ("p99", 0.99)] {
            if let Some(value) = self.latency_percentile(percentile) {
                output.push_str(&format!(
                    "# HELP qrand_latency_{}_microseconds Request latency {}\n",
                    label, label
                ));
                output.push_str(&format!("# TYPE qrand_latency_{}_microseconds gauge\n", label));
                output.push_str(&format!("qrand_latency_{}_microseconds {}\n", label, value));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn generation(n_bits: usize, backend: Backend, fallback: bool) -> Generation {
        Generation {
            bytes: Bytes::from(vec![0u8; n_bits.div_ceil(8)]),
            n_bits,
            backend,
            fallback_reason: fallback.then(|| "HTTP 503".to_string()),
        }
    }

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record_generation(&generation(16, Backend::Simulator, false), 100);
        metrics.record_generation(&generation(10, Backend::Hardware, false), 200);
        metrics.record_generation(&generation(9, Backend::Simulator, true), 300);
        metrics.record_rejection();
        metrics.record_failure();

        assert_eq!(metrics.requests_total(), 5);
        assert_eq!(metrics.requests_rejected(), 1);
        assert_eq!(metrics.requests_failed(), 1);
        assert_eq!(metrics.bits_generated(), 35);
        assert_eq!(metrics.bytes_served(), 2 + 2 + 2);
        assert_eq!(metrics.simulator_generations(), 2);
        assert_eq!(metrics.hardware_generations(), 1);
        assert_eq!(metrics.hardware_fallbacks(), 1);
    }

    #[test]
    fn test_latency_percentiles() {
        let metrics = Metrics::new();

        for i in 1..=100 {
            metrics.record_generation(&generation(8, Backend::Simulator, false), i);
        }

        let p50 = metrics.latency_percentile(0.50).unwrap();
        assert!((45..=55).contains(&p50));

        let p99 = metrics.latency_percentile(0.99).unwrap();
        assert!((95..=100).contains(&p99));
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = Metrics::new();
        metrics.record_generation(&generation(8, Backend::Simulator, true), 10);

        let text = metrics.prometheus_format();
        assert!(text.contains("qrand_requests_total 1\n"));
        assert!(text.contains("qrand_hardware_fallbacks 1\n"));
        assert!(text.contains("# TYPE qrand_uptime_seconds gauge"));
    }
}
