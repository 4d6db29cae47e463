use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use drover_core::{RunConfig, TaskConfig};

/// YAML shape of a test plan. Durations use humantime form ("30s", "500ms").
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlanYaml {
    pub target_base_url: String,
    pub tasks: Vec<TaskYaml>,

    #[serde(default)]
    pub users: Option<u64>,

    #[serde(default, with = "humantime_serde")]
    pub ramp_up: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub min_wait: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub max_wait: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,

    #[serde(default)]
    pub max_iterations: Option<u64>,

    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub shutdown_grace: Option<Duration>,

    #[serde(default)]
    pub random_seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TaskYaml {
    pub name: String,

    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default = "default_method")]
    pub method: String,

    pub path: String,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    #[serde(default)]
    pub id_min: Option<u64>,

    #[serde(default)]
    pub id_max: Option<u64>,
}

fn default_weight() -> u32 {
    1
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_expected_status() -> u16 {
    200
}

impl PlanYaml {
    pub fn into_config(self) -> RunConfig {
        let defaults = RunConfig::default();
        let task_defaults = TaskConfig::default();

        RunConfig {
            target_base_url: self.target_base_url,
            tasks: self
                .tasks
                .into_iter()
                .map(|t| TaskConfig {
                    name: t.name,
                    weight: t.weight,
                    method: t.method,
                    path: t.path,
                    body: t.body,
                    expected_status: t.expected_status,
                    id_min: t.id_min.unwrap_or(task_defaults.id_min),
                    id_max: t.id_max.unwrap_or(task_defaults.id_max),
                })
                .collect(),
            users: self.users.unwrap_or(defaults.users),
            ramp_up: self.ramp_up.unwrap_or(defaults.ramp_up),
            min_wait: self.min_wait.unwrap_or(defaults.min_wait),
            max_wait: self.max_wait.unwrap_or(defaults.max_wait),
            duration: self.duration,
            max_iterations: self.max_iterations,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            shutdown_grace: self.shutdown_grace.unwrap_or(defaults.shutdown_grace),
            random_seed: self.random_seed,
        }
    }
}

pub(crate) fn parse(input: &str) -> anyhow::Result<RunConfig> {
    let plan: PlanYaml = serde_yaml::from_str(input)?;
    Ok(plan.into_config())
}

pub(crate) async fn load(path: &Path) -> anyhow::Result<RunConfig> {
    let input = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read test plan: {}", path.display()))?;
    parse(&input).with_context(|| format!("failed to parse test plan: {}", path.display()))
}
