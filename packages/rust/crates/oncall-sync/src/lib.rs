//! On-call group sync: keep chat user groups in step with on-call rotations.
//!
//! - **Config**: rotation declarations collapse into canonical [`Schedule`]s keyed by
//!   current-group name (YAML file, environment, CLI overrides).
//! - **Sync**: one pass resolves who is on call for every schedule and rewrites a chat
//!   group only when its membership differs.
//! - **Runner**: passes repeat on a fixed cadence until shutdown.

#![allow(missing_docs)]

mod clients;
mod compare;
mod config;
mod error;
mod runner;
mod sync;

pub use clients::{
    ChatDirectory, DEFAULT_PAGERDUTY_API_URL, DEFAULT_SLACK_API_URL, GroupHandle, OnCallSource,
    PagerDutyClient, SlackDirectory,
};
pub use compare::equal_as_sets;
pub use config::{
    Config, DEFAULT_ALL_NAME_FORMAT, DEFAULT_CURRENT_NAME_FORMAT, DEFAULT_GROUP_NAME_PREFIX,
    DEFAULT_RUN_INTERVAL_SECS, DEFAULT_SCHEDULE_LOOKAHEAD, GroupConfig, GroupKind, GroupSelector,
    NameTemplates, RawDeclaration, Schedule, SyncSettings, UserGroupSettings, aggregate,
    load_settings, parse_schedule_declaration,
};
pub use error::{ConfigError, SyncError};
pub use runner::{RunLoopConfig, RunLoopOutcome, run_sync_loop};
pub use sync::{BranchOutcome, BranchReport, LiveSyncPass, SyncPass, SyncReport, reconcile};
