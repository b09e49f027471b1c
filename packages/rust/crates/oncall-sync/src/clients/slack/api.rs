//! Thin Slack Web API wrapper.
//!
//! Slack reports most failures as HTTP 200 with `{"ok": false, "error": "<code>"}`;
//! both that and transport failures surface as [`SlackApiError`].

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::super::GroupHandle;
use super::super::http::body_preview;

const USERS_PAGE_LIMIT: &str = "200";
/// Upper bound on `users.list` pages, so a looping cursor cannot spin forever.
const MAX_USER_PAGES: usize = 500;

#[derive(Debug)]
pub(super) struct SlackApiError {
    pub(super) code: Option<String>,
    pub(super) message: String,
}

impl SlackApiError {
    fn transport(method: &str, error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("{method} timed out: {error}")
        } else {
            format!("{method} request failed: {error}")
        };
        Self {
            code: None,
            message,
        }
    }

    /// Token rejected by Slack; retrying with the same token cannot succeed.
    pub(super) fn is_auth_failure(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some(
                "invalid_auth"
                    | "not_authed"
                    | "token_revoked"
                    | "token_expired"
                    | "account_inactive"
            )
        )
    }

    pub(super) fn is_name_taken(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some("name_already_exists" | "handle_already_exists")
        )
    }
}

impl fmt::Display for SlackApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SlackUser {
    pub(super) id: String,
    #[serde(default)]
    pub(super) deleted: bool,
    #[serde(default)]
    pub(super) profile: SlackUserProfile,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SlackUserProfile {
    #[serde(default)]
    pub(super) email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackUserGroup {
    id: String,
    name: String,
    /// Non-zero once the group has been disabled.
    #[serde(default)]
    date_delete: i64,
}

/// A user group as listed, including whether it is currently disabled.
#[derive(Debug, Clone)]
pub(super) struct ListedGroup {
    pub(super) handle: GroupHandle,
    pub(super) disabled: bool,
}

impl From<SlackUserGroup> for ListedGroup {
    fn from(group: SlackUserGroup) -> Self {
        Self {
            disabled: group.date_delete != 0,
            handle: GroupHandle {
                id: group.id,
                name: group.name,
            },
        }
    }
}

#[derive(Deserialize)]
struct UsersListPage {
    #[serde(default)]
    members: Vec<SlackUser>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct UserGroupsList {
    #[serde(default)]
    usergroups: Vec<SlackUserGroup>,
}

#[derive(Deserialize)]
struct UserGroupEnvelope {
    usergroup: SlackUserGroup,
}

#[derive(Deserialize)]
struct UserGroupMembers {
    #[serde(default)]
    users: Vec<String>,
}

pub(super) struct SlackApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackApi {
    pub(super) fn new(client: reqwest::Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SlackApiError> {
        let request = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.token)
            .query(query);
        self.execute(method, request).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, SlackApiError> {
        let request = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.token)
            .json(&payload);
        self.execute(method, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SlackApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| SlackApiError::transport(method, &error))?;
        let status = response.status();
        if !status.is_success() {
            let preview = body_preview(response).await;
            return Err(SlackApiError {
                code: None,
                message: format!("{method} failed: status={status} body={preview}"),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|error| SlackApiError {
            code: None,
            message: format!("{method} response decode failed: {error}"),
        })?;
        let ok = body
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if !ok {
            let code = body
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(SlackApiError {
                message: format!("{method} failed: {code}"),
                code: Some(code),
            });
        }

        serde_json::from_value(body).map_err(|error| SlackApiError {
            code: None,
            message: format!("{method} response has unexpected shape: {error}"),
        })
    }

    /// Every workspace user, following `users.list` cursors.
    pub(super) async fn list_users(&self) -> Result<Vec<SlackUser>, SlackApiError> {
        let mut users = Vec::new();
        let mut cursor = String::new();
        for _ in 0..MAX_USER_PAGES {
            let mut query = vec![("limit", USERS_PAGE_LIMIT)];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let page: UsersListPage = self.get("users.list", &query).await?;
            users.extend(page.members);

            cursor = page
                .response_metadata
                .and_then(|meta| meta.next_cursor)
                .map(|next| next.trim().to_string())
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(users);
            }
        }
        tracing::warn!(
            pages = MAX_USER_PAGES,
            users = users.len(),
            "slack users.list pagination limit reached; user snapshot may be incomplete"
        );
        Ok(users)
    }

    /// Every user group, disabled ones included so their names are not recreated.
    pub(super) async fn list_user_groups(&self) -> Result<Vec<ListedGroup>, SlackApiError> {
        let list: UserGroupsList = self
            .get("usergroups.list", &[("include_disabled", "true")])
            .await?;
        Ok(list.usergroups.into_iter().map(ListedGroup::from).collect())
    }

    pub(super) async fn create_user_group(&self, name: &str) -> Result<ListedGroup, SlackApiError> {
        let created: UserGroupEnvelope = self
            .post("usergroups.create", json!({ "name": name }))
            .await?;
        Ok(created.usergroup.into())
    }

    pub(super) async fn enable_user_group(&self, group_id: &str) -> Result<(), SlackApiError> {
        let _: UserGroupEnvelope = self
            .post("usergroups.enable", json!({ "usergroup": group_id }))
            .await?;
        Ok(())
    }

    pub(super) async fn user_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<String>, SlackApiError> {
        let members: UserGroupMembers = self
            .get("usergroups.users.list", &[("usergroup", group_id)])
            .await?;
        Ok(members.users)
    }

    pub(super) async fn update_user_group_members(
        &self,
        group_id: &str,
        member_ids: &[String],
    ) -> Result<(), SlackApiError> {
        let _: UserGroupEnvelope = self
            .post(
                "usergroups.users.update",
                json!({ "usergroup": group_id, "users": member_ids.join(",") }),
            )
            .await?;
        Ok(())
    }
}
