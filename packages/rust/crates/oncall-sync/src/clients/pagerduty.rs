//! PagerDuty REST adapter: who is on call for a schedule.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::SyncError;

use super::OnCallSource;
use super::http::{body_preview, build_http_client, trim_base_url};

pub const DEFAULT_PAGERDUTY_API_URL: &str = "https://api.pagerduty.com";

const CLIENT_NAME: &str = "pagerduty";
const ACCEPT_HEADER: &str = "application/vnd.pagerduty+json;version=2";
/// Window used for "on call right now"; PagerDuty needs `until` strictly after `since`.
const CURRENT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
struct ScheduleUsersResponse {
    #[serde(default)]
    users: Vec<ScheduleUser>,
}

#[derive(Deserialize)]
struct ScheduleUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Reads schedule membership through `GET /schedules/{id}/users`.
pub struct PagerDutyClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PagerDutyClient {
    pub fn new(token: &str) -> Result<Self, SyncError> {
        Self::with_base_url(token, DEFAULT_PAGERDUTY_API_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, SyncError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::ClientInit {
                client: CLIENT_NAME,
                message: "token is empty".to_string(),
            });
        }
        let client = build_http_client().map_err(|error| SyncError::ClientInit {
            client: CLIENT_NAME,
            message: error.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: trim_base_url(base_url),
            token: token.to_string(),
        })
    }

    async fn emails_in_window(
        &self,
        rotation_id: &str,
        window: Duration,
    ) -> Result<Vec<String>, SyncError> {
        let unavailable = |message: String| SyncError::UpstreamUnavailable {
            rotation_id: rotation_id.to_string(),
            message,
        };

        let since = Utc::now();
        let until = TimeDelta::from_std(window)
            .ok()
            .and_then(|delta| since.checked_add_signed(delta))
            .ok_or_else(|| unavailable(format!("lookahead {window:?} is out of range")))?;

        let started = Instant::now();
        let url = format!("{}/schedules/{}/users", self.base_url, rotation_id.trim());
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token token={}", self.token))
            .header("Accept", ACCEPT_HEADER)
            .query(&[
                ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ])
            .send()
            .await
            .map_err(|error| unavailable(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let preview = body_preview(response).await;
            return Err(unavailable(format!("status={status} body={preview}")));
        }

        let payload: ScheduleUsersResponse = response
            .json()
            .await
            .map_err(|error| unavailable(format!("decode failed: {error}")))?;

        let emails = dedup_emails(rotation_id, payload.users);
        tracing::debug!(
            rotation_id,
            window_secs = window.as_secs(),
            users = emails.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "pagerduty schedule users fetched"
        );
        Ok(emails)
    }
}

fn dedup_emails(rotation_id: &str, users: Vec<ScheduleUser>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut emails = Vec::with_capacity(users.len());
    for user in users {
        let Some(email) = user
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
        else {
            tracing::warn!(
                rotation_id,
                user_id = user.id.as_deref().unwrap_or("unknown"),
                "pagerduty user has no email; skipping"
            );
            continue;
        };
        if seen.insert(email.to_ascii_lowercase()) {
            emails.push(email);
        }
    }
    emails
}

#[async_trait]
impl OnCallSource for PagerDutyClient {
    async fn current_on_call(&self, rotation_id: &str) -> Result<Vec<String>, SyncError> {
        self.emails_in_window(rotation_id, CURRENT_WINDOW).await
    }

    async fn on_call_within(
        &self,
        rotation_id: &str,
        lookahead: Duration,
    ) -> Result<Vec<String>, SyncError> {
        self.emails_in_window(rotation_id, lookahead).await
    }
}
