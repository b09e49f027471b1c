//! Reconciliation of chat groups against on-call rotations.

mod engine;
mod pass;
mod report;

pub use engine::reconcile;
pub use pass::{LiveSyncPass, SyncPass};
pub use report::{BranchOutcome, BranchReport, SyncReport};
