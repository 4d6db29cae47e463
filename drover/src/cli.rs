use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim())
        .map_err(|err| format!("invalid duration '{input}': {err}"))
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit JSON progress lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "drover",
    author,
    version,
    about = "Drive weighted synthetic HTTP traffic against a target service",
    long_about = "drover drives concurrent synthetic HTTP traffic against a target service.\n\nA YAML test plan declares the target, a weighted task mix, the virtual user count, think-time bounds and a stop condition. drover runs the plan and reports per-task latency and outcome statistics.",
    after_help = "Examples:\n  drover run plan.yaml\n  drover run plan.yaml --users 50 --duration 30s\n  drover run plan.yaml --iterations 1000 --seed 42 --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a test plan against its target.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the YAML test plan.
    pub plan: PathBuf,

    /// Override the plan's virtual user count.
    #[arg(long)]
    pub users: Option<u64>,

    /// Override the plan's wall-clock duration (e.g. 30s, 2m).
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Override the plan's run-wide iteration budget.
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Seed the random source for a reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn run_parses_overrides() {
        let cli = Cli::try_parse_from([
            "drover", "run", "plan.yaml", "--users", "50", "--duration", "30s", "--seed", "7",
        ])
        .unwrap();

        let Command::Run(args) = cli.command;
        assert_eq!(args.plan, PathBuf::from("plan.yaml"));
        assert_eq!(args.users, Some(50));
        assert_eq!(args.duration, Some(Duration::from_secs(30)));
        assert_eq!(args.seed, Some(7));
        assert!(args.iterations.is_none());
    }

    #[test]
    fn bad_duration_is_rejected() {
        let err = Cli::try_parse_from(["drover", "run", "plan.yaml", "--duration", "soon"]);
        assert!(err.is_err());
    }
}
