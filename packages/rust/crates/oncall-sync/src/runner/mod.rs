//! Recurring run loop around [`SyncPass`](crate::sync::SyncPass).

mod run;
mod types;

pub use run::run_sync_loop;
pub use types::{RunLoopConfig, RunLoopOutcome};
