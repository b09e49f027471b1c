use crate::sync::SyncReport;

/// Config for the recurring sync loop.
#[derive(Debug, Clone)]
pub struct RunLoopConfig {
    /// Interval between pass starts in seconds.
    pub interval_secs: u64,
    /// Optional pass limit; `None` means run until shutdown.
    pub max_runs: Option<u64>,
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            interval_secs: crate::config::DEFAULT_RUN_INTERVAL_SECS,
            max_runs: None,
        }
    }
}

/// Aggregated counters over every completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLoopOutcome {
    /// Number of passes attempted, failed ones included.
    pub passes: u64,
    /// Passes abandoned before reconciling, e.g. because Slack was unreachable.
    pub failed_passes: u64,
    /// Group branches rewritten.
    pub updated: u64,
    /// Group branches already in sync.
    pub unchanged: u64,
    /// Group branches not required by configuration.
    pub skipped: u64,
    /// Group branches that failed and were left for the next pass.
    pub failed: u64,
}

impl RunLoopOutcome {
    pub(super) fn record(&mut self, report: &SyncReport) {
        self.passes += 1;
        self.updated += report.updated() as u64;
        self.unchanged += report.unchanged() as u64;
        self.skipped += report.skipped() as u64;
        self.failed += report.failed() as u64;
    }

    pub(super) fn record_failed_pass(&mut self) {
        self.passes += 1;
        self.failed_passes += 1;
    }
}
