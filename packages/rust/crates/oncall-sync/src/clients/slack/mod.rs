//! Slack adapter for [`ChatDirectory`](super::ChatDirectory).

mod api;
mod directory;

pub use directory::SlackDirectory;

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";
