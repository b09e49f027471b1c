//! Layered settings loader for oncall-sync.
//!
//! Loads and merges, lowest precedence first:
//! - Built-in defaults
//! - YAML file passed with `--config`
//! - Process environment (`PAGERDUTY_TOKEN`, `SCHEDULE_*`, ...)
//! - CLI overrides
//!
//! Scalars from a higher layer replace lower ones. Rotation declarations are
//! concatenated, file entries first.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

use super::aggregate::{DEFAULT_GROUP_NAME_PREFIX, NameTemplates, RawDeclaration, aggregate};
use super::model::Config;

pub const DEFAULT_RUN_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SCHEDULE_LOOKAHEAD: Duration = Duration::from_secs(60 * 60 * 24 * 100);

const SCHEDULE_KEY_PREFIX: &str = "SCHEDULE_";
const PAGERDUTY_TOKEN_KEY: &str = "PAGERDUTY_TOKEN";
const SLACK_TOKEN_KEY: &str = "SLACK_TOKEN";
const RUN_INTERVAL_KEY: &str = "RUN_INTERVAL_SECONDS";
const SCHEDULE_LOOKAHEAD_KEY: &str = "PAGERDUTY_SCHEDULE_LOOKAHEAD";
const GROUP_NAME_PREFIX_KEY: &str = "ON_CALL_GROUP_NAME_PREFIX";
const CURRENT_NAME_FORMAT_KEY: &str = "CURRENT_ON_CALL_NAME_FORMAT";
const ALL_NAME_FORMAT_KEY: &str = "ALL_ON_CALL_NAME_FORMAT";
const NO_PLURAL_TAG: &str = "noPlural";

/// Unvalidated settings from one source. `None` means "not set here".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncSettings {
    pub pager_duty_token: Option<String>,
    pub slack_token: Option<String>,
    /// Seconds, kept as text so environment values are validated in one place.
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub run_interval: Option<String>,
    pub pager_duty_look_ahead_duration: Option<String>,
    pub on_call_group_name_prefix: Option<String>,
    pub current_on_call_name_format: Option<String>,
    pub all_on_call_name_format: Option<String>,
    #[serde(default)]
    pub user_groups: Vec<UserGroupSettings>,
    /// Declarations from `SCHEDULE_*` variables; never read from YAML.
    #[serde(skip)]
    pub declarations: Vec<RawDeclaration>,
}

/// One `user-groups` entry of the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserGroupSettings {
    pub name: String,
    #[serde(default)]
    pub schedules: Vec<String>,
    pub groups: Option<String>,
    pub pluralize: Option<bool>,
    pub current_on_call_name_format: Option<String>,
    pub all_on_call_name_format: Option<String>,
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(text)) => Some(text),
        Some(serde_yaml::Value::Number(number)) => Some(number.to_string()),
        Some(serde_yaml::Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar run interval, got {other:?}"
            )));
        }
    })
}

impl SyncSettings {
    /// Read settings from a YAML file. Missing or malformed files are errors.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "reading config file");
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Build settings from environment pairs.
    ///
    /// `SCHEDULE_*` entries are processed in key order so aggregation is deterministic.
    pub fn from_env_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Self::default();
        let mut schedules: Vec<(String, String)> = Vec::new();

        for (key, value) in vars {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                PAGERDUTY_TOKEN_KEY => settings.pager_duty_token = Some(value),
                SLACK_TOKEN_KEY => settings.slack_token = Some(value),
                RUN_INTERVAL_KEY => settings.run_interval = Some(value),
                SCHEDULE_LOOKAHEAD_KEY => settings.pager_duty_look_ahead_duration = Some(value),
                GROUP_NAME_PREFIX_KEY => settings.on_call_group_name_prefix = Some(value),
                CURRENT_NAME_FORMAT_KEY => settings.current_on_call_name_format = Some(value),
                ALL_NAME_FORMAT_KEY => settings.all_on_call_name_format = Some(value),
                _ if key.starts_with(SCHEDULE_KEY_PREFIX) => schedules.push((key, value)),
                _ => {}
            }
        }

        schedules.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, value) in schedules {
            settings
                .declarations
                .push(parse_schedule_declaration(&value)?);
        }
        Ok(settings)
    }

    /// Layer `overlay` on top of `self`.
    #[must_use]
    pub fn merge(self, overlay: Self) -> Self {
        let mut user_groups = self.user_groups;
        user_groups.extend(overlay.user_groups);
        let mut declarations = self.declarations;
        declarations.extend(overlay.declarations);

        Self {
            pager_duty_token: overlay.pager_duty_token.or(self.pager_duty_token),
            slack_token: overlay.slack_token.or(self.slack_token),
            run_interval: overlay.run_interval.or(self.run_interval),
            pager_duty_look_ahead_duration: overlay
                .pager_duty_look_ahead_duration
                .or(self.pager_duty_look_ahead_duration),
            on_call_group_name_prefix: overlay
                .on_call_group_name_prefix
                .or(self.on_call_group_name_prefix),
            current_on_call_name_format: overlay
                .current_on_call_name_format
                .or(self.current_on_call_name_format),
            all_on_call_name_format: overlay
                .all_on_call_name_format
                .or(self.all_on_call_name_format),
            user_groups,
            declarations,
        }
    }

    /// All declarations in processing order: YAML user groups, then `SCHEDULE_*` entries.
    pub fn all_declarations(&self) -> Vec<RawDeclaration> {
        let mut out = Vec::new();
        for group in &self.user_groups {
            for rotation_id in &group.schedules {
                out.push(RawDeclaration {
                    rotation_id: rotation_id.clone(),
                    team_label: group.name.clone(),
                    group_selector: group.groups.clone(),
                    pluralize: group.pluralize,
                    current_name_format: group.current_on_call_name_format.clone(),
                    all_name_format: group.all_on_call_name_format.clone(),
                });
            }
        }
        out.extend(self.declarations.iter().cloned());
        out
    }

    fn name_templates(&self) -> (String, NameTemplates) {
        let prefix = match non_blank(self.on_call_group_name_prefix.as_deref()) {
            Some(prefix) => prefix.to_string(),
            None => {
                tracing::info!(
                    "{GROUP_NAME_PREFIX_KEY} not provided - defaulting to {DEFAULT_GROUP_NAME_PREFIX}"
                );
                DEFAULT_GROUP_NAME_PREFIX.to_string()
            }
        };
        let mut templates = NameTemplates::with_prefix(&prefix);
        if let Some(format) = non_blank(self.current_on_call_name_format.as_deref()) {
            templates.current = format.to_string();
        }
        if let Some(format) = non_blank(self.all_on_call_name_format.as_deref()) {
            templates.all = format.to_string();
        }
        (prefix, templates)
    }

    /// Validate and aggregate into the immutable run [`Config`].
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let pager_duty_token = non_blank(self.pager_duty_token.as_deref())
            .ok_or(ConfigError::MissingToken(PAGERDUTY_TOKEN_KEY))?
            .to_string();
        let slack_token = non_blank(self.slack_token.as_deref())
            .ok_or(ConfigError::MissingToken(SLACK_TOKEN_KEY))?
            .to_string();
        let run_interval_secs = parse_run_interval(self.run_interval.as_deref())?;
        let schedule_lookahead =
            parse_lookahead(self.pager_duty_look_ahead_duration.as_deref())?;

        let (group_name_prefix, templates) = self.name_templates();
        let schedules = aggregate(&self.all_declarations(), &templates)?;

        Ok(Config {
            schedules,
            pager_duty_token,
            slack_token,
            run_interval_secs,
            schedule_lookahead,
            group_name_prefix,
        })
    }
}

/// Parse one `SCHEDULE_*` value: `rotationID,teamLabel[,selector[,noPlural]]`.
pub fn parse_schedule_declaration(value: &str) -> Result<RawDeclaration, ConfigError> {
    let fields: Vec<&str> = value.split(',').collect();
    if fields.len() < 2 {
        return Err(ConfigError::MalformedDeclaration {
            value: value.to_string(),
            reason: "expecting schedule value to be a comma separated scheduleId,name".to_string(),
        });
    }

    let mut declaration = RawDeclaration::new(fields[0].trim(), fields[1].trim());
    if declaration.rotation_id.is_empty() || declaration.team_label.is_empty() {
        return Err(ConfigError::MalformedDeclaration {
            value: value.to_string(),
            reason: "schedule id and name must both be non-empty".to_string(),
        });
    }
    if let Some(selector) = fields.get(2).filter(|s| !s.trim().is_empty()) {
        declaration.group_selector = Some((*selector).to_string());
    }
    if fields.get(3).is_some_and(|flag| flag.trim() == NO_PLURAL_TAG) {
        declaration.pluralize = Some(false);
    }
    Ok(declaration)
}

/// Load file settings (when a path is given) layered under the given environment.
pub fn load_settings<I, K, V>(path: Option<&Path>, env: I) -> Result<SyncSettings, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let file = match path {
        Some(path) => SyncSettings::from_yaml_file(path)?,
        None => SyncSettings::default(),
    };
    Ok(file.merge(SyncSettings::from_env_vars(env)?))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_run_interval(value: Option<&str>) -> Result<u64, ConfigError> {
    let Some(raw) = non_blank(value) else {
        return Ok(DEFAULT_RUN_INTERVAL_SECS);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidRunInterval(raw.to_string())),
    }
}

fn parse_lookahead(value: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = non_blank(value) else {
        return Ok(DEFAULT_SCHEDULE_LOOKAHEAD);
    };
    humantime::parse_duration(raw).map_err(|source| ConfigError::InvalidLookahead {
        value: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_value_fields_are_optional_after_name() {
        let declaration = parse_schedule_declaration("1234,platform-engineer").expect("parse");
        assert_eq!(declaration, RawDeclaration::new("1234", "platform-engineer"));

        let declaration =
            parse_schedule_declaration("1234,platform-engineer,current,noPlural").expect("parse");
        assert_eq!(declaration.group_selector.as_deref(), Some("current"));
        assert_eq!(declaration.pluralize, Some(false));

        let declaration =
            parse_schedule_declaration("1234,platform-engineer,,plural").expect("parse");
        assert_eq!(declaration.group_selector, None);
        assert_eq!(declaration.pluralize, None);
    }

    #[test]
    fn schedule_value_without_name_is_malformed() {
        assert!(matches!(
            parse_schedule_declaration("1234"),
            Err(ConfigError::MalformedDeclaration { .. })
        ));
        assert!(matches!(
            parse_schedule_declaration(",team"),
            Err(ConfigError::MalformedDeclaration { .. })
        ));
    }

    #[test]
    fn lookahead_defaults_to_one_hundred_days() {
        assert_eq!(parse_lookahead(None).expect("default"), DEFAULT_SCHEDULE_LOOKAHEAD);
        assert_eq!(
            parse_lookahead(Some("24h")).expect("24h"),
            Duration::from_secs(24 * 3600)
        );
        assert!(parse_lookahead(Some("soon")).is_err());
    }

    #[test]
    fn run_interval_must_be_positive() {
        assert_eq!(parse_run_interval(None).expect("default"), 60);
        assert_eq!(parse_run_interval(Some("10")).expect("10"), 10);
        assert!(parse_run_interval(Some("0")).is_err());
        assert!(parse_run_interval(Some("ten")).is_err());
    }
}
