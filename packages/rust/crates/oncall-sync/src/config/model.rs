//! Canonical sync configuration built once at startup and read-only afterwards.

use std::fmt;
use std::time::Duration;

/// Which of the two chat groups of a schedule a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Whoever is on call right now.
    Current,
    /// Everyone on call within the lookahead window.
    All,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::All => "all",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One target chat group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Group name on the chat platform.
    pub name: String,
    /// `false` when the declaration opted out of this group; it is neither created nor synced.
    pub is_required: bool,
}

/// One synchronisation unit: rotations feeding a current group and an all group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Upstream rotation ids in declaration order (duplicates kept as given).
    pub rotation_ids: Vec<String>,
    pub current_group: GroupConfig,
    pub all_group: GroupConfig,
}

impl Schedule {
    pub fn group(&self, kind: GroupKind) -> &GroupConfig {
        match kind {
            GroupKind::Current => &self.current_group,
            GroupKind::All => &self.all_group,
        }
    }
}

/// Everything one run needs. Immutable once built by `SyncSettings::into_config`.
#[derive(Debug, Clone)]
pub struct Config {
    pub schedules: Vec<Schedule>,
    pub pager_duty_token: String,
    pub slack_token: String,
    /// Seconds between passes, always greater than zero.
    pub run_interval_secs: u64,
    /// Horizon for the all-on-call groups.
    pub schedule_lookahead: Duration,
    pub group_name_prefix: String,
}
