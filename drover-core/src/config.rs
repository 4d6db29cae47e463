use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Error, Result};

/// One entry of the task mix, as configured.
///
/// `path` and `body` may contain the `{id}` placeholder, which is replaced
/// per request with a uniform random integer in `id_min..=id_max`.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub name: String,
    pub weight: u32,
    pub method: String,
    pub path: String,
    pub body: Option<String>,
    pub expected_status: u16,
    pub id_min: u64,
    pub id_max: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: 1,
            method: "GET".to_string(),
            path: "/".to_string(),
            body: None,
            expected_status: 200,
            id_min: 1,
            id_max: 100,
        }
    }
}

/// Full configuration of one run. Validated up front by
/// [`RunController::new`](crate::RunController::new); no worker starts if any
/// constraint is violated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_base_url: String,
    pub tasks: Vec<TaskConfig>,

    pub users: u64,
    /// Users start staggered linearly across this window.
    pub ramp_up: Duration,

    /// Think-time bounds: each user pauses for a uniform random duration in
    /// `min_wait..=max_wait` between consecutive requests.
    pub min_wait: Duration,
    pub max_wait: Duration,

    /// Stop conditions; at least one must be set. `max_iterations` is a
    /// run-wide budget shared by all users.
    pub duration: Option<Duration>,
    pub max_iterations: Option<u64>,

    /// Uniform per-request timeout, applied by the transport.
    pub request_timeout: Duration,

    /// How long `stop` waits for users to finish their current iteration
    /// before abandoning them.
    pub shutdown_grace: Duration,

    /// Seed for reproducible runs; derived from entropy when absent.
    pub random_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_base_url: "http://127.0.0.1:8080".to_string(),
            tasks: Vec::new(),
            users: 1,
            ramp_up: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
            duration: None,
            max_iterations: None,
            request_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
            random_seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.users == 0 {
            return Err(Error::InvalidUsers);
        }

        match url::Url::parse(&self.target_base_url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => return Err(Error::InvalidBaseUrl(self.target_base_url.clone())),
        }

        if self.tasks.is_empty() {
            return Err(Error::NoTasks);
        }

        let mut names: HashSet<&str> = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if task.weight == 0 {
                return Err(Error::InvalidWeight(task.name.clone()));
            }
            if !names.insert(task.name.as_str()) {
                return Err(Error::DuplicateTask(task.name.clone()));
            }
            if task.method.parse::<http::Method>().is_err() {
                return Err(Error::InvalidMethod {
                    task: task.name.clone(),
                    method: task.method.clone(),
                });
            }
            if task.id_min > task.id_max {
                return Err(Error::InvalidIdRange(task.name.clone()));
            }
        }

        if self.min_wait > self.max_wait {
            return Err(Error::InvalidThinkTime);
        }

        if self.duration.is_none() && self.max_iterations.is_none() {
            return Err(Error::MissingStopCondition);
        }
        if self.max_iterations == Some(0) {
            return Err(Error::InvalidIterations);
        }

        if self.request_timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }

        Ok(())
    }
}
