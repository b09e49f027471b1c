//! One sync pass with freshly built clients.

use async_trait::async_trait;

use crate::clients::{
    DEFAULT_PAGERDUTY_API_URL, DEFAULT_SLACK_API_URL, PagerDutyClient, SlackDirectory,
};
use crate::config::Config;
use crate::error::SyncError;

use super::engine::reconcile;
use super::report::SyncReport;

/// Async pass abstraction so the run loop can drive live clients or test doubles.
#[async_trait]
pub trait SyncPass: Send + Sync {
    /// Run one complete pass. `Err` only for fatal conditions (client initialisation).
    async fn run_pass(&self, config: &Config) -> Result<SyncReport, SyncError>;
}

/// Pass backed by PagerDuty and Slack. Clients are rebuilt every pass so the Slack
/// snapshot never outlives the pass that loaded it.
#[derive(Debug, Clone)]
pub struct LiveSyncPass {
    pagerduty_base_url: String,
    slack_base_url: String,
}

impl Default for LiveSyncPass {
    fn default() -> Self {
        Self::with_base_urls(DEFAULT_PAGERDUTY_API_URL, DEFAULT_SLACK_API_URL)
    }
}

impl LiveSyncPass {
    pub fn with_base_urls(pagerduty_base_url: &str, slack_base_url: &str) -> Self {
        Self {
            pagerduty_base_url: pagerduty_base_url.to_string(),
            slack_base_url: slack_base_url.to_string(),
        }
    }
}

#[async_trait]
impl SyncPass for LiveSyncPass {
    async fn run_pass(&self, config: &Config) -> Result<SyncReport, SyncError> {
        let oncall =
            PagerDutyClient::with_base_url(&config.pager_duty_token, &self.pagerduty_base_url)?;
        let chat =
            SlackDirectory::connect_with_base_url(&config.slack_token, &self.slack_base_url).await?;
        Ok(reconcile(config, &oncall, &chat).await)
    }
}
