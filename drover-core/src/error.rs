pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`users` must be a positive integer")]
    InvalidUsers,

    #[error("at least one task must be defined")]
    NoTasks,

    #[error("task `{0}` must have a positive weight")]
    InvalidWeight(String),

    #[error("duplicate task name `{0}`")]
    DuplicateTask(String),

    #[error("task weights overflow when summed")]
    WeightOverflow,

    #[error("invalid http method `{method}` for task `{task}`")]
    InvalidMethod { task: String, method: String },

    #[error("task `{0}` has an empty id range (`id_min` must be <= `id_max`)")]
    InvalidIdRange(String),

    #[error("`min_wait` must not exceed `max_wait`")]
    InvalidThinkTime,

    #[error("either `duration` or `max_iterations` must be set")]
    MissingStopCondition,

    #[error("`max_iterations` must be a positive integer")]
    InvalidIterations,

    #[error("`request_timeout` must be a positive duration")]
    InvalidTimeout,

    #[error("invalid `target_base_url` `{0}` (expected an http:// or https:// URL)")]
    InvalidBaseUrl(String),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
