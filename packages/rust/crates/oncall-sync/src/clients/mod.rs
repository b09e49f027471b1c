//! Client seams for the on-call service and the chat platform.
//!
//! The sync engine only sees [`OnCallSource`] and [`ChatDirectory`]; PagerDuty and Slack
//! adapters implement them over HTTP, tests implement them in memory.

mod http;
mod pagerduty;
mod slack;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SyncError;

pub use pagerduty::{DEFAULT_PAGERDUTY_API_URL, PagerDutyClient};
pub use slack::{DEFAULT_SLACK_API_URL, SlackDirectory};

/// A resolved chat-platform group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHandle {
    pub id: String,
    pub name: String,
}

/// Read-only view of who is on call.
#[async_trait]
pub trait OnCallSource: Send + Sync {
    /// Emails of everyone on call for `rotation_id` at this instant.
    async fn current_on_call(&self, rotation_id: &str) -> Result<Vec<String>, SyncError>;

    /// Deduplicated emails of everyone on call for `rotation_id` within `[now, now + lookahead]`.
    async fn on_call_within(
        &self,
        rotation_id: &str,
        lookahead: Duration,
    ) -> Result<Vec<String>, SyncError>;
}

/// Chat-platform group and user directory.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Return the group named `name`, creating it when absent.
    async fn resolve_or_create_group(&self, name: &str) -> Result<GroupHandle, SyncError>;

    /// Member ids currently in `group`.
    async fn current_members(&self, group: &GroupHandle) -> Result<Vec<String>, SyncError>;

    /// Replace the membership of `group` with `member_ids`.
    async fn set_members(&self, group: &GroupHandle, member_ids: &[String])
    -> Result<(), SyncError>;

    /// Map emails to member ids, failing with `UnknownIdentity` if any email has no account.
    async fn resolve_member_ids(&self, emails: &[String]) -> Result<Vec<String>, SyncError>;
}
