use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rand::Rng as _;
use rand::SeedableRng as _;
use rand::rngs::SmallRng;
use tokio_util::sync::CancellationToken;

use drover_metrics::{Collector, Outcome};

use crate::gate::IterationGate;
use crate::scheduler::TaskScheduler;
use crate::transport::Transport;

/// Everything one virtual user needs to run its loop.
#[derive(Debug)]
pub(crate) struct UserContext<T> {
    pub user_id: u64,
    /// Ramp-up stagger: how long this user waits before its first request.
    pub start_delay: Duration,
    pub scheduler: Arc<TaskScheduler>,
    pub transport: Arc<T>,
    pub collector: Arc<Collector>,
    pub gate: Arc<IterationGate>,
    pub cancel: CancellationToken,
    pub active_users: Arc<AtomicU64>,
    pub request_timeout: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
    /// Base seed of the run; each user derives its own stream from it.
    pub seed: u64,
}

/// The virtual-user loop: draw a task, execute it, classify the outcome,
/// record it, think, repeat.
///
/// Transport failures never escape this loop; they become failed outcomes.
/// The loop ends when the shared cancellation token fires or the iteration
/// gate denies admission.
pub(crate) async fn run_user<T: Transport>(ctx: UserContext<T>) {
    if !ctx.start_delay.is_zero() {
        tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            _ = tokio::time::sleep(ctx.start_delay) => {}
        }
    }

    let mut rng = SmallRng::seed_from_u64(ctx.seed.wrapping_add(ctx.user_id));

    ctx.active_users.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(user = ctx.user_id, "virtual user started");

    loop {
        if ctx.cancel.is_cancelled() || !ctx.gate.next() {
            break;
        }

        let scheduled = ctx.scheduler.next(&mut rng);
        let task = scheduled.definition.name().clone();
        let expected = scheduled.definition.expected_status();

        let mut request = scheduled.request;
        request.timeout = Some(ctx.request_timeout);

        let started = Instant::now();
        let result = ctx.transport.execute(request).await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(response) if response.status == expected => Outcome::success(task, elapsed),
            Ok(response) => Outcome::failure(
                task,
                elapsed,
                format!("unexpected status {} (expected {expected})", response.status),
            ),
            Err(err) => Outcome::failure(task, elapsed, err.kind().to_string()),
        };
        ctx.collector.record(outcome);

        let think = think_time(&mut rng, ctx.min_wait, ctx.max_wait);
        if !think.is_zero() {
            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                _ = tokio::time::sleep(think) => {}
            }
        }
    }

    ctx.active_users.fetch_sub(1, Ordering::Relaxed);
    tracing::debug!(user = ctx.user_id, "virtual user stopped");
}

fn think_time(rng: &mut SmallRng, min: Duration, max: Duration) -> Duration {
    if max.is_zero() || min >= max {
        return min;
    }
    Duration::from_secs_f64(rng.random_range(min.as_secs_f64()..=max.as_secs_f64()))
}
