mod args;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use simq::config::QueueConfig;
use simq::dashboard::Dashboard;
use simq::queue::JobQueue;
use simq::types::computer::Launcher;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

use crate::args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logging goes to stderr, leaving stdout to the dashboard.
    if args.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(io::stderr)
            .init();
    } else if args.json {
        tracing_subscriber::fmt().json().with_writer(io::stderr).init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_writer(io::stderr)
            .init();
    }

    let config = match config_from(&args) {
        Ok(config) => config,
        Err(error) => {
            error!("unsupported configuration: {error:#}");
            return ExitCode::from(2);
        },
    };

    // Ctrl-C kills the running simulation and abandons the rest.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(error) = signal::ctrl_c().await {
                warn!(%error, "something strange with ctrl-c handling!");
            };
            cancel.cancel();
        });
    }

    if let Err(error) = begin(args, config, cancel).await {
        error!("encountered runtime error: {error:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn config_from(args: &Args) -> Result<QueueConfig> {
    let sampling_interval = Duration::try_from_secs_f64(args.update)
        .ok()
        .filter(|d| !d.is_zero())
        .context("--update must be a positive number of seconds")?;

    let timeout = args
        .timeout
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .context("--timeout must be a non-negative number of seconds")
        })
        .transpose()?;

    let mut config = QueueConfig {
        root_dir: args.root_dir.clone(),
        simulation_dirs: args.simulation_dir.clone(),
        sampling_interval,
        launcher: Launcher {
            mpirun: args.mpirun.clone(),
            binary: args.lmp.clone(),
        },
        timeout,
        ..QueueConfig::default()
    };
    // A directory holding the named input script always qualifies.
    config.suffixes.extend([args.input_format.clone()]);
    config.suffixes.extend(args.suffixes.iter().cloned());

    Ok(config)
}

async fn begin(
    args: Args,
    config: QueueConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let mut queue = JobQueue::new(config).context("discovering simulations")?;
    info!(
        root = %queue.config().root_dir.display(),
        suffixes = ?queue.config().suffixes.iter().collect::<Vec<_>>(),
        "scanning for simulations"
    );
    queue
        .build(&args.computer, &args.input_format)
        .context("building queue")?;

    let mut dashboard = Dashboard::new(io::stdout());
    let summary = queue.run(&mut dashboard, &cancel).await;

    println!("\n{}", summary.message());
    info!(
        launched = summary.launched(),
        wall_time_secs = summary.wall_time_secs,
        "run finished"
    );

    if let Some(path) = &args.report {
        let yaml = summary.to_yaml().context("serialising report")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "wrote report");
    }

    Ok(())
}
