use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::OutputFormatter;
use drover_core::{ProgressFn, RunConfig, RunReport};

pub(crate) struct HumanReadableOutput {
    bar: ProgressBar,
}

impl HumanReadableOutput {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::new_spinner(),
        }
    }
}

fn fmt_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{ms:.1}ms"),
        None => "-".to_string(),
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, plan_path: &Path, config: &RunConfig) {
        let stop = match (config.duration, config.max_iterations) {
            (Some(d), Some(n)) => format!("{} or {n} iterations", humantime::format_duration(d)),
            (Some(d), None) => humantime::format_duration(d).to_string(),
            (None, Some(n)) => format!("{n} iterations"),
            (None, None) => "-".to_string(),
        };

        eprintln!(
            "plan={} target={} users={} ramp_up={} stop={stop}",
            plan_path.display(),
            config.target_base_url,
            config.users,
            humantime::format_duration(config.ramp_up),
        );
    }

    fn progress(&self) -> Option<ProgressFn> {
        let bar = self.bar.clone();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Some(Arc::new(move |u| {
            bar.set_message(format!(
                "{} elapsed | {} users | {} requests ({} failed) | {:.1} req/s",
                humantime::format_duration(Duration::from_secs(u.elapsed.as_secs())),
                u.active_users,
                u.requests_total,
                u.failures_total,
                u.rps_now,
            ));
        }))
    }

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        self.bar.finish_and_clear();

        println!(
            "run finished in {}: {} requests, {} failed, {:.1} req/s ({} users{})",
            humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64)),
            report.requests_total(),
            report.failures_total(),
            report.rps(),
            report.users,
            if report.abandoned_users > 0 {
                format!(", {} abandoned", report.abandoned_users)
            } else {
                String::new()
            },
        );

        for (name, stats) in &report.snapshot.tasks {
            println!(
                "  {name}: count={} ok={} failed={}",
                stats.count, stats.success_count, stats.failure_count
            );
            println!(
                "    latency min={} mean={} p50={} p90={} p95={} p99={} max={}",
                fmt_ms(stats.latency.min_ms),
                fmt_ms(stats.latency.mean_ms),
                fmt_ms(stats.latency.p50_ms),
                fmt_ms(stats.latency.p90_ms),
                fmt_ms(stats.latency.p95_ms),
                fmt_ms(stats.latency.p99_ms),
                fmt_ms(stats.latency.max_ms),
            );
            for (reason, count) in &stats.failure_reasons {
                println!("    failure: {reason} x{count}");
            }
        }

        Ok(())
    }
}
