use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::error::SyncError;
use crate::sync::SyncPass;

use super::types::{RunLoopConfig, RunLoopOutcome};

/// Run sync passes on a fixed cadence until `max_runs` is reached or `shutdown` turns `true`.
///
/// The first pass starts immediately. Passes never overlap, and a shutdown request
/// received mid-pass takes effect once that pass has finished. A pass that fails with a
/// non-fatal error is counted in `failed_passes` and retried on the next tick; a fatal
/// error (rejected credentials) ends the loop with `Err`.
pub async fn run_sync_loop(
    pass: &dyn SyncPass,
    config: &Config,
    mut loop_config: RunLoopConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RunLoopOutcome, SyncError> {
    if loop_config.interval_secs == 0 {
        tracing::warn!("run interval of 0 seconds is not allowed; using 1 second");
        loop_config.interval_secs = 1;
    }
    if loop_config.max_runs == Some(0) {
        return Ok(RunLoopOutcome::default());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(loop_config.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut outcome = RunLoopOutcome::default();

    loop {
        let reached_limit = loop_config
            .max_runs
            .is_some_and(|max_runs| outcome.passes >= max_runs);
        if reached_limit || *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                run_one_pass(pass, config, &loop_config, &mut outcome).await?;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    tracing::debug!("shutdown sender dropped; running until pass limit");
                    return run_without_shutdown(pass, config, &loop_config, ticker, outcome).await;
                }
                tracing::info!(passes = outcome.passes, "sync loop received shutdown; stopping");
            }
        }
    }

    Ok(outcome)
}

async fn run_without_shutdown(
    pass: &dyn SyncPass,
    config: &Config,
    loop_config: &RunLoopConfig,
    mut ticker: tokio::time::Interval,
    mut outcome: RunLoopOutcome,
) -> Result<RunLoopOutcome, SyncError> {
    while !loop_config
        .max_runs
        .is_some_and(|max_runs| outcome.passes >= max_runs)
    {
        ticker.tick().await;
        run_one_pass(pass, config, loop_config, &mut outcome).await?;
    }
    Ok(outcome)
}

async fn run_one_pass(
    pass: &dyn SyncPass,
    config: &Config,
    loop_config: &RunLoopConfig,
    outcome: &mut RunLoopOutcome,
) -> Result<(), SyncError> {
    let started = Instant::now();
    match pass.run_pass(config).await {
        Ok(report) => {
            outcome.record(&report);
            tracing::info!(
                run = outcome.passes,
                interval_secs = loop_config.interval_secs,
                failed = report.failed(),
                elapsed_ms = started.elapsed().as_millis(),
                "sync pass completed"
            );
            Ok(())
        }
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => {
            outcome.record_failed_pass();
            tracing::warn!(
                run = outcome.passes,
                error = %error,
                elapsed_ms = started.elapsed().as_millis(),
                "sync pass failed; retrying on next tick"
            );
            Ok(())
        }
    }
}
