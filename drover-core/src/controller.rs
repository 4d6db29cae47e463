use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use drover_metrics::{Collector, StatsSnapshot};

use crate::config::RunConfig;
use crate::error::Result;
use crate::gate::IterationGate;
use crate::pool::{PoolParams, WorkerPool};
use crate::progress::{ProgressFn, ProgressUpdate};
use crate::scheduler::TaskScheduler;
use crate::task::TaskDefinition;
use crate::transport::Transport;

/// Final result of a run: the stats snapshot plus run-level context.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub elapsed: Duration,
    pub users: u64,
    /// Users aborted at shutdown because they outlived the grace period.
    pub abandoned_users: u64,
    pub snapshot: StatsSnapshot,
}

impl RunReport {
    pub fn requests_total(&self) -> u64 {
        self.snapshot.requests_total()
    }

    pub fn failures_total(&self) -> u64 {
        self.snapshot.failures_total()
    }

    pub fn rps(&self) -> f64 {
        self.requests_total() as f64 / self.elapsed.as_secs_f64().max(1e-9)
    }
}

/// Orchestrates a single run end-to-end.
///
/// Construction validates the configuration and fails fast; nothing is
/// spawned and no request is issued on a rejected config. A successfully
/// constructed controller is driven with [`run`](Self::run), which returns
/// once the stop condition is reached and all users have been joined.
pub struct RunController<T> {
    config: RunConfig,
    transport: Arc<T>,
    cancel: CancellationToken,
}

impl<T: Transport> RunController<T> {
    pub fn new(config: RunConfig, transport: Arc<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// External cancellation entry point: cancelling this token stops the run
    /// through the same graceful path as a duration or iteration stop. Safe
    /// to hand to a signal handler.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self) -> Result<RunReport> {
        self.run_with_progress(None).await
    }

    pub async fn run_with_progress(self, progress: Option<ProgressFn>) -> Result<RunReport> {
        let definitions: Vec<TaskDefinition> = self
            .config
            .tasks
            .iter()
            .map(|t| TaskDefinition::from_config(t, &self.config.target_base_url))
            .collect::<Result<_>>()?;
        let scheduler = Arc::new(TaskScheduler::new(definitions)?);

        let collector = Arc::new(Collector::new());
        let gate = Arc::new(IterationGate::new(
            self.config.max_iterations,
            self.config.duration,
        ));
        let seed = self.config.random_seed.unwrap_or_else(rand::random);

        let started = Instant::now();
        gate.start_at(started);

        let mut pool = WorkerPool::start(
            PoolParams {
                users: self.config.users,
                ramp_up: self.config.ramp_up,
                request_timeout: self.config.request_timeout,
                min_wait: self.config.min_wait,
                max_wait: self.config.max_wait,
                shutdown_grace: self.config.shutdown_grace,
                seed,
            },
            scheduler,
            self.transport.clone(),
            collector.clone(),
            gate,
            self.cancel.child_token(),
        );

        let progress_handle = progress.map(|progress| {
            let collector = collector.clone();
            let active = pool.active_users_handle();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick fires immediately; skip it so the first
                // update covers a real interval.
                interval.tick().await;

                let mut last_at = Instant::now();
                let mut last_requests = 0u64;
                loop {
                    interval.tick().await;

                    let now = Instant::now();
                    let dt = now.duration_since(last_at);
                    last_at = now;

                    let requests_total = collector.requests_total();
                    let delta = requests_total.saturating_sub(last_requests);
                    last_requests = requests_total;

                    (progress)(ProgressUpdate {
                        elapsed: started.elapsed(),
                        active_users: active.load(std::sync::atomic::Ordering::Relaxed),
                        requests_total,
                        failures_total: collector.failures_total(),
                        rps_now: delta as f64 / dt.as_secs_f64().max(1e-9),
                    });
                }
            })
        });

        // Wait for whichever stop condition fires first. Users drain on their
        // own when the iteration budget or deadline runs out; the deadline
        // branch additionally cuts short users sleeping in think-time.
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = pool.wait_idle() => {}
            _ = sleep_opt(self.config.duration) => {}
        }

        let pool_report = pool.stop().await;

        if let Some(handle) = progress_handle {
            handle.abort();
            let _ = handle.await;
        }

        Ok(RunReport {
            elapsed: started.elapsed(),
            users: self.config.users,
            abandoned_users: pool_report.abandoned,
            snapshot: collector.snapshot(),
        })
    }
}

async fn sleep_opt(duration: Option<Duration>) {
    match duration {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}
