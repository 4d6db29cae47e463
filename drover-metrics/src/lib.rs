//! Thread-safe aggregation of per-task-name request outcomes.
//!
//! The [`Collector`] is the single write-shared sink of a run: every virtual
//! user records [`Outcome`]s into it, and the run controller reads an
//! immutable [`StatsSnapshot`] out of it at the end (or at any point while
//! the run is still going). Latencies are kept in fixed-memory HDR
//! histograms, never as raw sample buffers, so memory stays bounded on
//! arbitrarily long runs.

#![forbid(unsafe_code)]

mod collector;
mod snapshot;

pub use collector::{Collector, Outcome};
pub use snapshot::{LatencySummary, StatsSnapshot, TaskStats};
