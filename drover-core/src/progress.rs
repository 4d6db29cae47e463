use std::sync::Arc;
use std::time::Duration;

/// Callback invoked roughly once per second while a run is active.
pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Live totals for one progress tick. Informational only; the final report
/// comes from the collector snapshot, not from these.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub elapsed: Duration,
    pub active_users: u64,
    pub requests_total: u64,
    pub failures_total: u64,
    /// Requests completed since the previous tick, per second.
    pub rps_now: f64,
}
