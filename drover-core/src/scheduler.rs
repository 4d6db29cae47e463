use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::{Error, Result};
use crate::task::{ScheduledTask, TaskDefinition};

/// Weighted chooser over the task mix.
///
/// The cumulative weight table is built once here; every `next` is one
/// uniform draw resolved by binary search, with no per-call allocation.
/// The scheduler itself is immutable after construction and shared read-only
/// by all virtual users; randomness comes from the caller's rng, so a seeded
/// rng gives a fully reproducible selection sequence.
#[derive(Debug)]
pub struct TaskScheduler {
    tasks: Vec<TaskDefinition>,
    index: WeightedIndex<u32>,
}

impl TaskScheduler {
    pub fn new(tasks: Vec<TaskDefinition>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(Error::NoTasks);
        }
        for task in &tasks {
            if task.weight() == 0 {
                return Err(Error::InvalidWeight(task.name().to_string()));
            }
        }

        // Weights are validated above, so the only way this can fail is the
        // summed weights overflowing.
        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight()))
            .map_err(|_| Error::WeightOverflow)?;

        Ok(Self { tasks, index })
    }

    /// Draws the next task and builds its request from the same rng.
    pub fn next<'a, R: Rng>(&'a self, rng: &mut R) -> ScheduledTask<'a> {
        let definition = &self.tasks[self.index.sample(rng)];
        ScheduledTask {
            definition,
            request: definition.build_request(rng),
        }
    }

    pub fn definitions(&self) -> &[TaskDefinition] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::TaskConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;

    fn definitions(weights: &[(&str, u32)]) -> Vec<TaskDefinition> {
        weights
            .iter()
            .map(|(name, weight)| {
                TaskDefinition::from_config(
                    &TaskConfig {
                        name: name.to_string(),
                        weight: *weight,
                        ..TaskConfig::default()
                    },
                    "http://127.0.0.1:1",
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_mix_is_rejected() {
        assert!(matches!(
            TaskScheduler::new(Vec::new()),
            Err(Error::NoTasks)
        ));
    }

    #[test]
    fn zero_weight_is_rejected() {
        let defs = definitions(&[("a", 1), ("b", 0)]);
        assert!(matches!(
            TaskScheduler::new(defs),
            Err(Error::InvalidWeight(name)) if name == "b"
        ));
    }

    #[test]
    fn draw_frequencies_converge_to_weight_ratios() {
        let scheduler = TaskScheduler::new(definitions(&[("a", 8), ("b", 2)])).unwrap();
        let mut rng = SmallRng::seed_from_u64(1234);

        let draws = 100_000;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for _ in 0..draws {
            let scheduled = scheduler.next(&mut rng);
            *counts
                .entry(scheduled.definition.name().to_string())
                .or_insert(0) += 1;
        }

        let a = counts["a"] as f64 / draws as f64;
        let b = counts["b"] as f64 / draws as f64;
        assert!((a - 0.8).abs() < 0.01, "a frequency {a}");
        assert!((b - 0.2).abs() < 0.01, "b frequency {b}");
        assert_eq!(counts["a"] + counts["b"], draws);
    }

    #[test]
    fn three_way_mix_respects_all_weights() {
        let scheduler = TaskScheduler::new(definitions(&[("x", 2), ("y", 1), ("z", 1)])).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);

        let draws = 40_000;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for _ in 0..draws {
            *counts
                .entry(scheduler.next(&mut rng).definition.name().to_string())
                .or_insert(0) += 1;
        }

        assert!((counts["x"] as f64 / draws as f64 - 0.5).abs() < 0.015);
        assert!((counts["y"] as f64 / draws as f64 - 0.25).abs() < 0.015);
        assert!((counts["z"] as f64 / draws as f64 - 0.25).abs() < 0.015);
    }

    #[test]
    fn same_seed_gives_same_selection_sequence() {
        let scheduler = TaskScheduler::new(definitions(&[("a", 3), ("b", 1)])).unwrap();

        let mut first = SmallRng::seed_from_u64(5);
        let mut second = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(
                scheduler.next(&mut first).definition.name(),
                scheduler.next(&mut second).definition.name()
            );
        }
    }
}
