use tracing_subscriber::EnvFilter;

const CRATE_NAMES: &[&str] = &["drover", "drover_core", "drover_http", "drover_metrics"];

/// Initialize the logger for testing.
///
/// This logs to the writer registered by the Rust test runner, and only
/// captures logs from the harness crates.
///
/// # Example
///
/// ```
/// drover_testserver::tracing::init();
/// ```
pub fn init() {
    let mut env_filter = EnvFilter::new("ERROR");

    // Add all internal crates with maximum log-level.
    for name in CRATE_NAMES {
        if let Ok(directive) = format!("{name}=TRACE").parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
