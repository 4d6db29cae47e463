use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use drover_metrics::Collector;

use crate::gate::IterationGate;
use crate::scheduler::TaskScheduler;
use crate::transport::Transport;
use crate::vu::{UserContext, run_user};

pub(crate) struct PoolParams {
    pub users: u64,
    pub ramp_up: Duration,
    pub request_timeout: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub shutdown_grace: Duration,
    pub seed: u64,
}

/// Spawns and supervises the virtual users of one run.
pub(crate) struct WorkerPool {
    users: JoinSet<()>,
    cancel: CancellationToken,
    grace: Duration,
    active_users: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PoolReport {
    /// Users that did not stop within the grace period and were aborted.
    /// Their last in-flight outcome may be lost.
    pub abandoned: u64,
}

impl WorkerPool {
    /// Starts `params.users` virtual users, staggered linearly across the
    /// ramp-up window: user `i` begins after `ramp_up * i / users`.
    pub fn start<T: Transport>(
        params: PoolParams,
        scheduler: Arc<TaskScheduler>,
        transport: Arc<T>,
        collector: Arc<Collector>,
        gate: Arc<IterationGate>,
        cancel: CancellationToken,
    ) -> Self {
        let active_users = Arc::new(AtomicU64::new(0));
        let mut users = JoinSet::new();

        for i in 0..params.users {
            let start_delay = if params.ramp_up.is_zero() {
                Duration::ZERO
            } else {
                params.ramp_up.mul_f64(i as f64 / params.users as f64)
            };

            let ctx = UserContext {
                user_id: i + 1,
                start_delay,
                scheduler: scheduler.clone(),
                transport: transport.clone(),
                collector: collector.clone(),
                gate: gate.clone(),
                cancel: cancel.clone(),
                active_users: active_users.clone(),
                request_timeout: params.request_timeout,
                min_wait: params.min_wait,
                max_wait: params.max_wait,
                seed: params.seed,
            };
            users.spawn(run_user(ctx));
        }

        Self {
            users,
            cancel,
            grace: params.shutdown_grace,
            active_users,
        }
    }

    /// Shared counter of users currently inside their loop; outlives the
    /// pool borrow so the progress tick can read it.
    pub fn active_users_handle(&self) -> Arc<AtomicU64> {
        self.active_users.clone()
    }

    /// Resolves once every user has exited on its own (budget or deadline).
    /// Cancel-safe: callers may race this against other stop conditions.
    pub async fn wait_idle(&mut self) {
        while self.users.join_next().await.is_some() {}
    }

    /// Signals cancellation and joins all users, aborting any that are still
    /// running after the grace period.
    pub async fn stop(mut self) -> PoolReport {
        self.cancel.cancel();

        let users = &mut self.users;
        let drained = tokio::time::timeout(self.grace, async {
            while users.join_next().await.is_some() {}
        })
        .await;

        let mut report = PoolReport::default();
        if drained.is_err() {
            report.abandoned = self.users.len() as u64;
            tracing::warn!(
                abandoned = report.abandoned,
                grace = ?self.grace,
                "virtual users did not stop within the grace period; aborting them \
                 (their in-flight outcomes may be lost)"
            );
            self.users.abort_all();
            while self.users.join_next().await.is_some() {}
        }

        report
    }
}
