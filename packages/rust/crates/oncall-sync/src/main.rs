//! oncall-sync CLI: `run` the sync loop or `check` the configuration.
//!
//! Configuration comes from `--config <file>` layered under environment variables
//! (`PAGERDUTY_TOKEN`, `SLACK_TOKEN`, `SCHEDULE_*`, ...).
//!
//! Logging: set `RUST_LOG=oncall_sync=debug` (or `warn`) to adjust stderr logs.

mod cli;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use oncall_sync::{Config, LiveSyncPass, RunLoopConfig, load_settings, run_sync_loop};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "oncall_sync=debug"
        } else {
            "oncall_sync=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = load_settings(cli.config.as_deref(), std::env::vars())
        .and_then(oncall_sync::SyncSettings::into_config)
        .context("could not parse config")?;

    match cli.command {
        Command::Check => {
            print_schedules(&config);
            Ok(())
        }
        Command::Run {
            once,
            max_runs,
            interval_secs,
        } => run_mode(&config, once, max_runs, interval_secs).await,
    }
}

async fn run_mode(
    config: &Config,
    once: bool,
    max_runs: Option<u64>,
    interval_secs: Option<u64>,
) -> anyhow::Result<()> {
    let loop_config = RunLoopConfig {
        interval_secs: interval_secs.unwrap_or(config.run_interval_secs),
        max_runs: if once { Some(1) } else { max_runs },
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(
        schedules = config.schedules.len(),
        interval_secs = loop_config.interval_secs,
        max_runs = ?loop_config.max_runs,
        "starting, going to sync schedules"
    );
    let outcome = run_sync_loop(&LiveSyncPass::default(), config, loop_config, shutdown_rx)
        .await
        .context("could not sync schedules")?;

    tracing::info!(
        passes = outcome.passes,
        failed_passes = outcome.failed_passes,
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        skipped = outcome.skipped,
        failed = outcome.failed,
        "stopped"
    );
    Ok(())
}

fn print_schedules(config: &Config) {
    println!(
        "{} schedule(s), interval={}s, lookahead={}",
        config.schedules.len(),
        config.run_interval_secs,
        humantime::format_duration(config.schedule_lookahead)
    );
    for schedule in &config.schedules {
        println!(
            "rotations={} current={} (required={}) all={} (required={})",
            schedule.rotation_ids.join(","),
            schedule.current_group.name,
            schedule.current_group.is_required,
            schedule.all_group.name,
            schedule.all_group.is_required,
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
