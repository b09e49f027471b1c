//! Per-pass outcome records.

use crate::config::GroupKind;
use crate::error::SyncError;

/// What happened to one group branch of one schedule.
#[derive(Debug)]
pub enum BranchOutcome {
    /// Membership differed and was rewritten.
    Updated {
        added: Vec<String>,
        removed: Vec<String>,
    },
    /// Membership already matched; no write issued.
    Unchanged,
    /// Group not required by its declaration.
    Skipped,
    /// Branch failed this pass and will be retried next pass.
    Failed(SyncError),
}

#[derive(Debug)]
pub struct BranchReport {
    pub group_name: String,
    pub kind: GroupKind,
    pub rotation_ids: Vec<String>,
    pub outcome: BranchOutcome,
}

/// Every branch attempted in one pass, in processing order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub branches: Vec<BranchReport>,
}

impl SyncReport {
    pub fn updated(&self) -> usize {
        self.count(|outcome| matches!(outcome, BranchOutcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|outcome| matches!(outcome, BranchOutcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, BranchOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, BranchOutcome::Failed(_)))
    }

    /// Branch report for `group_name`, if one was recorded.
    pub fn branch(&self, group_name: &str) -> Option<&BranchReport> {
        self.branches
            .iter()
            .find(|branch| branch.group_name == group_name)
    }

    fn count(&self, predicate: impl Fn(&BranchOutcome) -> bool) -> usize {
        self.branches
            .iter()
            .filter(|branch| predicate(&branch.outcome))
            .count()
    }
}
