//! Pass-scoped Slack directory: a snapshot of users and user groups taken at connect time.
//!
//! Build a new [`SlackDirectory`] for every pass; changes made outside this process are
//! only seen by the next snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SyncError;

use super::super::http::{build_http_client, trim_base_url};
use super::super::{ChatDirectory, GroupHandle};
use super::api::{ListedGroup, SlackApi, SlackApiError, SlackUser};

const CLIENT_NAME: &str = "slack";

pub struct SlackDirectory {
    api: SlackApi,
    /// Lowercased email to user id.
    user_ids_by_email: HashMap<String, String>,
    groups: RwLock<Vec<ListedGroup>>,
}

impl SlackDirectory {
    /// Connect with `token` against `base_url` and take the user/group snapshot.
    ///
    /// A blank or rejected token is a fatal [`SyncError::ClientInit`]. Any other snapshot
    /// failure is [`SyncError::ChatUnavailable`], so the pass is skipped and retried.
    pub async fn connect_with_base_url(token: &str, base_url: &str) -> Result<Self, SyncError> {
        let init_failed = |message: String| SyncError::ClientInit {
            client: CLIENT_NAME,
            message,
        };

        let token = token.trim();
        if token.is_empty() {
            return Err(init_failed("token is empty".to_string()));
        }
        let client = build_http_client().map_err(|error| init_failed(error.to_string()))?;
        let api = SlackApi::new(client, trim_base_url(base_url), token.to_string());

        let groups = api
            .list_user_groups()
            .await
            .map_err(|error| snapshot_failed("usergroups.list", error))?;
        let users = api
            .list_users()
            .await
            .map_err(|error| snapshot_failed("users.list", error))?;
        let user_ids_by_email = index_users_by_email(users);

        tracing::debug!(
            groups = groups.len(),
            users = user_ids_by_email.len(),
            "slack snapshot loaded"
        );
        Ok(Self {
            api,
            user_ids_by_email,
            groups: RwLock::new(groups),
        })
    }

    async fn find_group(&self, name: &str) -> Option<ListedGroup> {
        self.groups
            .read()
            .await
            .iter()
            .find(|group| group.handle.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Return `group` ready for use, re-enabling it first when it was disabled.
    async fn ensure_enabled(&self, group: ListedGroup) -> Result<GroupHandle, SyncError> {
        if !group.disabled {
            return Ok(group.handle);
        }
        self.api
            .enable_user_group(&group.handle.id)
            .await
            .map_err(|error| SyncError::WriteFailure {
                group: group.handle.name.clone(),
                message: error.message,
            })?;
        tracing::info!(
            group = %group.handle.name,
            group_id = %group.handle.id,
            "disabled slack user group re-enabled"
        );
        if let Some(listed) = self
            .groups
            .write()
            .await
            .iter_mut()
            .find(|listed| listed.handle.id == group.handle.id)
        {
            listed.disabled = false;
        }
        Ok(group.handle)
    }

    async fn refresh_groups(&self) -> Result<(), SyncError> {
        let groups = self
            .api
            .list_user_groups()
            .await
            .map_err(|error| chat_unavailable("usergroups.list", &error))?;
        *self.groups.write().await = groups;
        Ok(())
    }
}

fn index_users_by_email(users: Vec<SlackUser>) -> HashMap<String, String> {
    let mut index = HashMap::with_capacity(users.len());
    for user in users {
        if user.deleted {
            continue;
        }
        let Some(email) = user
            .profile
            .email
            .map(|email| email.trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
        else {
            continue;
        };
        index.entry(email).or_insert(user.id);
    }
    index
}

fn snapshot_failed(operation: &'static str, error: SlackApiError) -> SyncError {
    if error.is_auth_failure() {
        SyncError::ClientInit {
            client: CLIENT_NAME,
            message: error.message,
        }
    } else {
        SyncError::ChatUnavailable {
            operation,
            message: error.message,
        }
    }
}

fn chat_unavailable(operation: &'static str, error: &SlackApiError) -> SyncError {
    SyncError::ChatUnavailable {
        operation,
        message: error.message.clone(),
    }
}

#[async_trait]
impl ChatDirectory for SlackDirectory {
    async fn resolve_or_create_group(&self, name: &str) -> Result<GroupHandle, SyncError> {
        if let Some(group) = self.find_group(name).await {
            return self.ensure_enabled(group).await;
        }

        match self.api.create_user_group(name).await {
            Ok(group) => {
                tracing::info!(
                    group = %group.handle.name,
                    group_id = %group.handle.id,
                    "slack user group created"
                );
                let handle = group.handle.clone();
                self.groups.write().await.push(group);
                Ok(handle)
            }
            Err(error) if error.is_name_taken() => {
                tracing::debug!(
                    group = name,
                    error = %error,
                    "slack user group already exists; refreshing snapshot"
                );
                self.refresh_groups().await?;
                let group =
                    self.find_group(name)
                        .await
                        .ok_or_else(|| SyncError::GroupCreateConflict {
                            group: name.to_string(),
                            message: error.message,
                        })?;
                self.ensure_enabled(group).await
            }
            Err(error) => Err(SyncError::WriteFailure {
                group: name.to_string(),
                message: error.message,
            }),
        }
    }

    async fn current_members(&self, group: &GroupHandle) -> Result<Vec<String>, SyncError> {
        self.api
            .user_group_members(&group.id)
            .await
            .map_err(|error| chat_unavailable("usergroups.users.list", &error))
    }

    async fn set_members(
        &self,
        group: &GroupHandle,
        member_ids: &[String],
    ) -> Result<(), SyncError> {
        if member_ids.is_empty() {
            return Err(SyncError::WriteFailure {
                group: group.name.clone(),
                message: "slack user groups cannot be emptied".to_string(),
            });
        }
        self.api
            .update_user_group_members(&group.id, member_ids)
            .await
            .map_err(|error| SyncError::WriteFailure {
                group: group.name.clone(),
                message: error.message,
            })
    }

    async fn resolve_member_ids(&self, emails: &[String]) -> Result<Vec<String>, SyncError> {
        let mut ids = Vec::with_capacity(emails.len());
        let mut unknown = Vec::new();
        for email in emails {
            match self
                .user_ids_by_email
                .get(&email.trim().to_ascii_lowercase())
            {
                Some(id) => ids.push(id.clone()),
                None => unknown.push(email.clone()),
            }
        }
        if unknown.is_empty() {
            Ok(ids)
        } else {
            Err(SyncError::UnknownIdentity { emails: unknown })
        }
    }
}
