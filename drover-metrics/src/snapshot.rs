use std::collections::BTreeMap;

use hdrhistogram::Histogram;

/// Point-in-time copy of everything a run has recorded so far.
///
/// Each task's entry is internally consistent (counts and latencies were read
/// under the same lock), but entries for different tasks are not captured
/// atomically with respect to each other. That relaxed view is fine for
/// reporting, which is the only consumer.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub tasks: BTreeMap<String, TaskStats>,
}

impl StatsSnapshot {
    pub fn requests_total(&self) -> u64 {
        self.tasks.values().map(|t| t.count).sum()
    }

    pub fn failures_total(&self) -> u64 {
        self.tasks.values().map(|t| t.failure_count).sum()
    }
}

/// Aggregate statistics for one task name.
#[derive(Debug, Clone)]
pub struct TaskStats {
    pub count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub latency: LatencySummary,
    /// Failure reason -> occurrence count.
    pub failure_reasons: BTreeMap<String, u64>,
}

/// Latency percentiles in milliseconds, `None` when nothing was recorded.
#[derive(Debug, Clone, Default)]
pub struct LatencySummary {
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p90_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

pub(crate) fn summarize_latency(h: &Histogram<u64>) -> LatencySummary {
    let count = h.len();
    let to_ms = |us: u64| us as f64 / 1000.0;

    LatencySummary {
        min_ms: (count > 0).then(|| to_ms(h.min())),
        max_ms: (count > 0).then(|| to_ms(h.max())),
        mean_ms: (count > 0).then(|| h.mean() / 1000.0),
        p50_ms: (count > 0).then(|| to_ms(h.value_at_quantile(0.50))),
        p90_ms: (count > 0).then(|| to_ms(h.value_at_quantile(0.90))),
        p95_ms: (count > 0).then(|| to_ms(h.value_at_quantile(0.95))),
        p99_ms: (count > 0).then(|| to_ms(h.value_at_quantile(0.99))),
    }
}
