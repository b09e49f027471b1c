use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oncall-sync")]
#[command(about = "Keep Slack user groups in step with PagerDuty on-call rotations.")]
pub(crate) struct Cli {
    /// YAML config file; environment variables override its values.
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Debug logging (ignored when RUST_LOG is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sync on a fixed interval until Ctrl+C / SIGTERM.
    Run {
        /// Run a single pass and exit.
        #[arg(long, conflicts_with = "max_runs")]
        once: bool,

        /// Stop after this many passes.
        #[arg(long)]
        max_runs: Option<u64>,

        /// Override the configured interval between passes (seconds, at least 1).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
    },
    /// Load and validate configuration, then print the resolved schedules.
    Check,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn interval_override_must_be_positive() {
        let error = Cli::try_parse_from(["oncall-sync", "run", "--interval-secs", "0"])
            .err()
            .expect("zero interval rejected");
        assert_eq!(error.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["oncall-sync", "run", "--interval-secs", "5"])
            .expect("positive interval");
        assert!(matches!(
            cli.command,
            Command::Run {
                interval_secs: Some(5),
                ..
            }
        ));
    }

    #[test]
    fn once_conflicts_with_max_runs() {
        assert!(Cli::try_parse_from(["oncall-sync", "run", "--once", "--max-runs", "2"]).is_err());
    }
}
