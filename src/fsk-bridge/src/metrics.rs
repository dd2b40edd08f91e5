//! Bridge counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for requests and responses crossing the bridge.
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// Request Artifacts successfully written.
    pub requests_written: AtomicU64,

    /// Requests dropped because one was already in flight.
    pub dropped_busy: AtomicU64,

    /// Requests dropped because the runtime was not ready.
    pub dropped_unavailable: AtomicU64,

    /// Request Artifact writes that failed.
    pub write_failures: AtomicU64,

    /// Response Artifacts consumed.
    pub responses_consumed: AtomicU64,

    /// Responses under the short-content threshold.
    pub short_content_warnings: AtomicU64,

    /// Outbound calls forwarded into the bridge.
    pub api_calls_forwarded: AtomicU64,

    /// Outbound calls rejected by the interceptor.
    pub calls_rejected: AtomicU64,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_written(&self) {
        self.requests_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_busy(&self) {
        self.dropped_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_unavailable(&self) {
        self.dropped_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumed(&self) {
        self.responses_consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_short_content(&self) {
        self.short_content_warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.api_calls_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.calls_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_written: self.requests_written.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dropped_unavailable: self.dropped_unavailable.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            responses_consumed: self.responses_consumed.load(Ordering::Relaxed),
            short_content_warnings: self.short_content_warnings.load(Ordering::Relaxed),
            api_calls_forwarded: self.api_calls_forwarded.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_written: u64,
    pub dropped_busy: u64,
    pub dropped_unavailable: u64,
    pub write_failures: u64,
    pub responses_consumed: u64,
    pub short_content_warnings: u64,
    pub api_calls_forwarded: u64,
    pub calls_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = BridgeMetrics::new();

        metrics.record_written();
        metrics.record_written();
        metrics.record_dropped_busy();
        metrics.record_consumed();
        metrics.record_short_content();

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_written, 2);
        assert_eq!(snap.dropped_busy, 1);
        assert_eq!(snap.responses_consumed, 1);
        assert_eq!(snap.short_content_warnings, 1);
        assert_eq!(snap.write_failures, 0);
    }
}
