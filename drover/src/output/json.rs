use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::OutputFormatter;
use drover_core::{LatencySummary, ProgressFn, RunConfig, RunReport, TaskStats};

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _plan_path: &Path, _config: &RunConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u| {
            emit_json_line(&JsonProgressLine {
                kind: "progress",
                elapsed_seconds: u.elapsed.as_secs_f64(),
                active_users: u.active_users,
                requests_total: u.requests_total,
                failures_total: u.failures_total,
                requests_per_sec: u.rps_now,
            });
        }))
    }

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        emit_json_line(&JsonSummaryLine::from_report(report));
        Ok(())
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    if let Ok(s) = serde_json::to_string(line) {
        println!("{s}");
    }
}

#[derive(Debug, Serialize)]
struct JsonProgressLine {
    kind: &'static str,
    elapsed_seconds: f64,
    active_users: u64,
    requests_total: u64,
    failures_total: u64,
    requests_per_sec: f64,
}

#[derive(Debug, Serialize)]
struct JsonLatency {
    min_ms: Option<f64>,
    max_ms: Option<f64>,
    mean_ms: Option<f64>,
    p50_ms: Option<f64>,
    p90_ms: Option<f64>,
    p95_ms: Option<f64>,
    p99_ms: Option<f64>,
}

impl From<&LatencySummary> for JsonLatency {
    fn from(latency: &LatencySummary) -> Self {
        Self {
            min_ms: latency.min_ms,
            max_ms: latency.max_ms,
            mean_ms: latency.mean_ms,
            p50_ms: latency.p50_ms,
            p90_ms: latency.p90_ms,
            p95_ms: latency.p95_ms,
            p99_ms: latency.p99_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonTaskStats {
    count: u64,
    success_count: u64,
    failure_count: u64,
    latency: JsonLatency,
    failure_reasons: BTreeMap<String, u64>,
}

impl From<&TaskStats> for JsonTaskStats {
    fn from(stats: &TaskStats) -> Self {
        Self {
            count: stats.count,
            success_count: stats.success_count,
            failure_count: stats.failure_count,
            latency: JsonLatency::from(&stats.latency),
            failure_reasons: stats.failure_reasons.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonSummaryLine {
    kind: &'static str,
    elapsed_seconds: f64,
    users: u64,
    abandoned_users: u64,
    requests_total: u64,
    failures_total: u64,
    requests_per_sec: f64,
    tasks: BTreeMap<String, JsonTaskStats>,
}

impl JsonSummaryLine {
    fn from_report(report: &RunReport) -> Self {
        Self {
            kind: "summary",
            elapsed_seconds: report.elapsed.as_secs_f64(),
            users: report.users,
            abandoned_users: report.abandoned_users,
            requests_total: report.requests_total(),
            failures_total: report.failures_total(),
            requests_per_sec: report.rps(),
            tasks: report
                .snapshot
                .tasks
                .iter()
                .map(|(name, stats)| (name.clone(), JsonTaskStats::from(stats)))
                .collect(),
        }
    }
}
