use std::sync::Arc;

use crate::cli::RunArgs;
use crate::{output, plan_yaml};

use drover_core::{RunConfig, RunController};
use drover_http::HttpClient;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let out = output::formatter(args.output);

    let mut config = plan_yaml::load(&args.plan).await?;
    apply_overrides(&mut config, &args);

    let client = Arc::new(HttpClient::default());
    let controller = RunController::new(config, client)?;

    out.print_header(&args.plan, controller.config());

    // Ctrl-C takes the same cooperative path as a duration or budget stop.
    let cancel = controller.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupt received, stopping run");
            cancel.cancel();
        }
    });

    let report = controller.run_with_progress(out.progress()).await?;
    out.print_report(&report)?;

    Ok(())
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(users) = args.users {
        config.users = users;
    }
    if let Some(duration) = args.duration {
        config.duration = Some(duration);
    }
    if let Some(iterations) = args.iterations {
        config.max_iterations = Some(iterations);
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
}
