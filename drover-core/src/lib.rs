//! The harness core: drives concurrent synthetic HTTP traffic against a
//! target service according to a declarative weighted task mix, and
//! aggregates per-task-name latency and outcome statistics.
//!
//! The moving parts, leaves first:
//!
//! - [`TaskDefinition`]: one synthetic request shape plus its relative
//!   weight. Pure data, built once from a [`RunConfig`].
//! - [`TaskScheduler`]: immutable weighted chooser shared by all users.
//! - virtual user (internal): the per-user loop of draw, execute, record,
//!   think-time. Runs until cancelled or out of budget.
//! - worker pool (internal): spawns and supervises the users, staggering
//!   startup across the ramp-up window and joining them with a bounded
//!   grace period on stop.
//! - [`RunController`]: validates the config, wires everything together,
//!   waits for the stop condition and produces the final [`RunReport`].
//!
//! The HTTP transport is injected through the [`Transport`] trait, so tests
//! can drive the whole engine against an in-process fake.

#![forbid(unsafe_code)]

mod config;
mod controller;
mod error;
mod gate;
mod pool;
mod progress;
mod scheduler;
mod task;
mod transport;
mod vu;

pub use config::{RunConfig, TaskConfig};
pub use controller::{RunController, RunReport};
pub use error::{Error, Result};
pub use gate::IterationGate;
pub use progress::{ProgressFn, ProgressUpdate};
pub use scheduler::TaskScheduler;
pub use task::{ScheduledTask, TaskDefinition};
pub use transport::Transport;

pub use drover_metrics::{Collector, LatencySummary, Outcome, StatsSnapshot, TaskStats};
pub use tokio_util::sync::CancellationToken;
