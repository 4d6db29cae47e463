use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use hdrhistogram::Histogram;
use parking_lot::Mutex;

use crate::snapshot::{StatsSnapshot, TaskStats, summarize_latency};

/// Result of executing one scheduled task. Consumed by [`Collector::record`].
#[derive(Debug, Clone)]
pub struct Outcome {
    pub task: Arc<str>,
    pub elapsed: Duration,
    /// `None` on success, otherwise a short reason string.
    pub failure: Option<String>,
}

impl Outcome {
    pub fn success(task: Arc<str>, elapsed: Duration) -> Self {
        Self {
            task,
            elapsed,
            failure: None,
        }
    }

    pub fn failure(task: Arc<str>, elapsed: Duration, reason: impl Into<String>) -> Self {
        Self {
            task,
            elapsed,
            failure: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

// Latencies are tracked in microseconds, up to 60s with 3 significant figures.
const LATENCY_MAX_US: u64 = 60_000_000;

pub(crate) fn new_latency_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, LATENCY_MAX_US, 3)
        .unwrap_or_else(|err| panic!("failed to init histogram: {err}"))
}

#[derive(Debug)]
struct TaskAggregate {
    count: u64,
    success_count: u64,
    failure_count: u64,
    latency_us: Histogram<u64>,
    failure_reasons: BTreeMap<String, u64>,
}

impl TaskAggregate {
    fn new() -> Self {
        Self {
            count: 0,
            success_count: 0,
            failure_count: 0,
            latency_us: new_latency_histogram(),
            failure_reasons: BTreeMap::new(),
        }
    }
}

/// Write-shared aggregator of per-task outcomes.
///
/// `record` takes one short per-task critical section, so concurrent virtual
/// users contend only when they hit the same task name at the same instant.
#[derive(Debug, Default)]
pub struct Collector {
    tasks: DashMap<Arc<str>, Arc<Mutex<TaskAggregate>>>,

    // Run-wide totals, readable without touching any per-task lock. Used by
    // the live progress tick.
    requests_total: AtomicU64,
    failures_total: AtomicU64,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !outcome.is_success() {
            self.failures_total.fetch_add(1, Ordering::Relaxed);
        }

        // Clone the aggregate handle out so the map shard is not held while
        // we update; writers on the same task serialize only on its mutex.
        let agg = {
            let entry = self
                .tasks
                .entry(outcome.task.clone())
                .or_insert_with(|| Arc::new(Mutex::new(TaskAggregate::new())));
            Arc::clone(entry.value())
        };

        let mut agg = agg.lock();
        agg.count += 1;
        match outcome.failure {
            None => agg.success_count += 1,
            Some(reason) => {
                agg.failure_count += 1;
                *agg.failure_reasons.entry(reason).or_insert(0) += 1;
            }
        }

        let us = (outcome.elapsed.as_micros() as u64).clamp(1, LATENCY_MAX_US);
        let _ = agg.latency_us.record(us);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn failures_total(&self) -> u64 {
        self.failures_total.load(Ordering::Relaxed)
    }

    /// Immutable point-in-time copy, safe to read while workers still record.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut tasks = BTreeMap::new();
        for entry in self.tasks.iter() {
            let agg = entry.value().lock();
            tasks.insert(
                entry.key().to_string(),
                TaskStats {
                    count: agg.count,
                    success_count: agg.success_count,
                    failure_count: agg.failure_count,
                    latency: summarize_latency(&agg.latency_us),
                    failure_reasons: agg.failure_reasons.clone(),
                },
            );
        }
        StatsSnapshot { tasks }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn task(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn success_and_failure_split_adds_up() {
        let collector = Collector::new();
        collector.record(Outcome::success(task("a"), Duration::from_millis(5)));
        collector.record(Outcome::failure(
            task("a"),
            Duration::from_millis(7),
            "unexpected status 500 (expected 200)",
        ));
        collector.record(Outcome::success(task("b"), Duration::from_millis(1)));

        let snap = collector.snapshot();
        let a = &snap.tasks["a"];
        assert_eq!(a.count, 2);
        assert_eq!(a.success_count, 1);
        assert_eq!(a.failure_count, 1);
        assert_eq!(a.success_count + a.failure_count, a.count);
        assert_eq!(
            a.failure_reasons["unexpected status 500 (expected 200)"],
            1
        );

        assert_eq!(snap.requests_total(), 3);
        assert_eq!(snap.failures_total(), 1);
    }

    #[test]
    fn latency_summary_reflects_recorded_durations() {
        let collector = Collector::new();
        for ms in [10u64, 20, 30, 40] {
            collector.record(Outcome::success(task("a"), Duration::from_millis(ms)));
        }

        let snap = collector.snapshot();
        let latency = &snap.tasks["a"].latency;
        assert!(latency.min_ms.unwrap() <= 10.5);
        assert!(latency.max_ms.unwrap() >= 39.0);
        assert!(latency.mean_ms.unwrap() > 10.0);
        assert!(latency.p99_ms.unwrap() >= latency.p50_ms.unwrap());
    }

    #[test]
    fn sub_microsecond_outcomes_still_count_into_latency() {
        let collector = Collector::new();
        collector.record(Outcome::success(task("a"), Duration::ZERO));

        let snap = collector.snapshot();
        assert_eq!(snap.tasks["a"].count, 1);
        assert!(snap.tasks["a"].latency.min_ms.is_some());
    }

    #[test]
    fn concurrent_recording_never_loses_or_double_counts() {
        let collector = Arc::new(Collector::new());
        let threads = 8;
        let per_thread = 2_000u64;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let collector = Arc::clone(&collector);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        let outcome = if (t + i) % 3 == 0 {
                            Outcome::failure(task("hot"), Duration::from_micros(i + 1), "timeout")
                        } else {
                            Outcome::success(task("hot"), Duration::from_micros(i + 1))
                        };
                        collector.record(outcome);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = collector.snapshot();
        let hot = &snap.tasks["hot"];
        assert_eq!(hot.count, threads * per_thread);
        assert_eq!(hot.success_count + hot.failure_count, hot.count);
        assert_eq!(collector.requests_total(), threads * per_thread);
    }

    #[test]
    fn snapshot_while_recording_keeps_per_task_invariant() {
        let collector = Arc::new(Collector::new());
        let writer = {
            let collector = Arc::clone(&collector);
            std::thread::spawn(move || {
                for i in 0..20_000u64 {
                    let outcome = if i % 2 == 0 {
                        Outcome::success(task("x"), Duration::from_micros(5))
                    } else {
                        Outcome::failure(task("x"), Duration::from_micros(5), "boom")
                    };
                    collector.record(outcome);
                }
            })
        };

        // Race snapshots against the writer; every observation must be
        // internally consistent even though the totals keep moving.
        for _ in 0..50 {
            let snap = collector.snapshot();
            if let Some(x) = snap.tasks.get("x") {
                assert_eq!(x.success_count + x.failure_count, x.count);
            }
        }

        writer.join().unwrap();
        let snap = collector.snapshot();
        assert_eq!(snap.tasks["x"].count, 20_000);
    }
}
