use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Run-wide admission gate for iterations.
///
/// Shared by all virtual users: `next()` answers whether one more iteration
/// may start, enforcing the optional run-wide iteration budget and the
/// optional wall-clock deadline. With a budget of N, exactly N calls ever
/// return `true`, regardless of how many users race on it.
#[derive(Debug)]
pub struct IterationGate {
    counter: AtomicU64,
    iterations: Option<u64>,
    duration: Option<Duration>,
    deadline: OnceLock<Instant>,
}

impl IterationGate {
    pub fn new(iterations: Option<u64>, duration: Option<Duration>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            iterations,
            duration,
            deadline: OnceLock::new(),
        }
    }

    pub fn start_at(&self, started: Instant) {
        if self.deadline.get().is_some() {
            return;
        }

        if let Some(duration) = self.duration {
            let _ = self.deadline.set(started + duration);
        }
    }

    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    /// Claims one iteration. Returns `false` once the budget is spent or the
    /// deadline has passed.
    pub fn next(&self) -> bool {
        // Hot path: avoid timekeeping entirely unless we're in duration mode.
        if self.duration.is_some() {
            let now = Instant::now();

            // If the controller didn't explicitly set a start time, lazily
            // initialize the deadline from the first observed iteration.
            if self.deadline.get().is_none() {
                self.start_at(now);
            }

            if let Some(deadline) = self.deadline.get()
                && now >= *deadline
            {
                return false;
            }
        }

        if let Some(total) = self.iterations {
            let idx = self.counter.fetch_add(1, Ordering::Relaxed);
            if idx >= total {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn budget_admits_exactly_n_iterations() {
        let gate = IterationGate::new(Some(5), None);
        let admitted = (0..10).filter(|_| gate.next()).count();
        assert_eq!(admitted, 5);
    }

    #[test]
    fn budget_is_exact_under_contention() {
        let gate = Arc::new(IterationGate::new(Some(1000), None));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || (0..1000).filter(|_| gate.next()).count())
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap_or(0)).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn passed_deadline_denies_admission() {
        let gate = IterationGate::new(None, Some(Duration::from_millis(10)));
        gate.start_at(Instant::now() - Duration::from_secs(1));
        assert!(!gate.next());
    }

    #[test]
    fn open_deadline_admits() {
        let gate = IterationGate::new(None, Some(Duration::from_secs(60)));
        gate.start();
        assert!(gate.next());
    }
}
