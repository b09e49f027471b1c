//! Collapse raw rotation declarations into canonical schedules.
//!
//! Declarations whose rendered current-group name collide are merged into one
//! [`Schedule`]: the first declaration fixes names and required flags, later ones only
//! contribute rotation ids.

use std::collections::HashMap;

use crate::error::ConfigError;

use super::model::{GroupConfig, Schedule};

/// Default template for the "current on-call" group.
pub const DEFAULT_CURRENT_NAME_FORMAT: &str = "current-oncall-%s";
/// Default template for the "all on-call" group (pluralized by the trailing `s`).
pub const DEFAULT_ALL_NAME_FORMAT: &str = "all-oncall-%ss";
/// Default prefix for current groups, equivalent to [`DEFAULT_CURRENT_NAME_FORMAT`].
pub const DEFAULT_GROUP_NAME_PREFIX: &str = "current-oncall";

const PLACEHOLDER: &str = "%s";
const ALL_GROUP_TAG: &str = "all";
const CURRENT_GROUP_TAG: &str = "current";

/// One rotation declaration as written by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawDeclaration {
    pub rotation_id: String,
    pub team_label: String,
    /// Pipe-delimited `all`/`current` tokens; `None` (or blank) requires both groups.
    pub group_selector: Option<String>,
    /// `Some(false)` drops the plural `s` from the all-group name.
    pub pluralize: Option<bool>,
    /// Overrides the global current-group template for this declaration.
    pub current_name_format: Option<String>,
    /// Overrides the global all-group template for this declaration.
    pub all_name_format: Option<String>,
}

impl RawDeclaration {
    pub fn new(rotation_id: impl Into<String>, team_label: impl Into<String>) -> Self {
        Self {
            rotation_id: rotation_id.into(),
            team_label: team_label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.group_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn with_pluralize(mut self, pluralize: bool) -> Self {
        self.pluralize = Some(pluralize);
        self
    }

    #[must_use]
    pub fn with_name_formats(
        mut self,
        current: Option<String>,
        all: Option<String>,
    ) -> Self {
        self.current_name_format = current;
        self.all_name_format = all;
        self
    }
}

/// Which groups a declaration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSelector {
    pub current: bool,
    pub all: bool,
}

impl GroupSelector {
    pub const BOTH: Self = Self {
        current: true,
        all: true,
    };

    /// Parse an optional `current|all` selector. Missing or blank means both.
    pub fn parse(selector: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = selector.filter(|value| !value.trim().is_empty()) else {
            return Ok(Self::BOTH);
        };

        let mut parsed = Self {
            current: false,
            all: false,
        };
        for token in raw.split('|').map(str::trim) {
            let slot = match token {
                ALL_GROUP_TAG => &mut parsed.all,
                CURRENT_GROUP_TAG => &mut parsed.current,
                _ => {
                    return Err(ConfigError::InvalidGroupSelector {
                        selector: raw.to_string(),
                        token: token.to_string(),
                    });
                }
            };
            if *slot {
                return Err(ConfigError::DuplicateGroupSelector {
                    selector: raw.to_string(),
                    token: token.to_string(),
                });
            }
            *slot = true;
        }
        Ok(parsed)
    }
}

/// Group name templates, each with a single `%s` placeholder for the team label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplates {
    pub current: String,
    pub all: String,
}

impl Default for NameTemplates {
    fn default() -> Self {
        Self {
            current: DEFAULT_CURRENT_NAME_FORMAT.to_string(),
            all: DEFAULT_ALL_NAME_FORMAT.to_string(),
        }
    }
}

impl NameTemplates {
    /// Templates whose current group is `<prefix>-<label>`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            current: format!("{prefix}-{PLACEHOLDER}"),
            all: DEFAULT_ALL_NAME_FORMAT.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_format(&self.current)?;
        validate_format(&self.all)
    }

    pub fn current_name(&self, team_label: &str) -> String {
        render(&self.current, team_label, true)
    }

    pub fn all_name(&self, team_label: &str, pluralize: bool) -> String {
        render(&self.all, team_label, pluralize)
    }
}

fn validate_format(format: &str) -> Result<(), ConfigError> {
    if format.matches(PLACEHOLDER).count() == 1 {
        Ok(())
    } else {
        Err(ConfigError::InvalidNameFormat {
            format: format.to_string(),
        })
    }
}

/// Substitute `team_label`. Without pluralization, an `s` directly after the placeholder
/// is dropped only when it ends the template (`all-oncall-%ss`).
fn render(format: &str, team_label: &str, pluralize: bool) -> String {
    let format = match format.strip_suffix('s') {
        Some(stem) if !pluralize && stem.ends_with(PLACEHOLDER) => stem,
        _ => format,
    };
    format.replacen(PLACEHOLDER, team_label, 1)
}

/// Turn declarations into schedules, merging those that share a current-group name.
///
/// Output order follows the first appearance of each current-group name.
pub fn aggregate(
    declarations: &[RawDeclaration],
    templates: &NameTemplates,
) -> Result<Vec<Schedule>, ConfigError> {
    templates.validate()?;

    let mut schedules: Vec<Schedule> = Vec::new();
    let mut index_by_current_name: HashMap<String, usize> = HashMap::new();

    for declaration in declarations {
        let rotation_id = declaration.rotation_id.trim();
        let team_label = declaration.team_label.trim();
        if rotation_id.is_empty() || team_label.is_empty() {
            return Err(ConfigError::MalformedDeclaration {
                value: format!("{},{}", declaration.rotation_id, declaration.team_label),
                reason: "rotation id and team label must both be non-empty".to_string(),
            });
        }

        let selector = GroupSelector::parse(declaration.group_selector.as_deref())?;
        let effective = declaration_templates(declaration, templates)?;
        let pluralize = declaration.pluralize.unwrap_or(true);

        let current_group = GroupConfig {
            name: effective.current_name(team_label),
            is_required: selector.current,
        };
        let all_group = GroupConfig {
            name: effective.all_name(team_label, pluralize),
            is_required: selector.all,
        };

        if let Some(&index) = index_by_current_name.get(&current_group.name) {
            let existing = &mut schedules[index];
            if existing.current_group != current_group || existing.all_group != all_group {
                tracing::warn!(
                    group = %existing.current_group.name,
                    rotation_id,
                    "declaration merged into an existing schedule; its group settings are ignored"
                );
            }
            existing.rotation_ids.push(rotation_id.to_string());
            continue;
        }

        index_by_current_name.insert(current_group.name.clone(), schedules.len());
        schedules.push(Schedule {
            rotation_ids: vec![rotation_id.to_string()],
            current_group,
            all_group,
        });
    }

    if schedules.is_empty() {
        return Err(ConfigError::NoSchedulesConfigured);
    }
    for (first, second) in case_only_collisions(&schedules) {
        tracing::warn!(
            first = %first,
            second = %second,
            "current-group names differ only in case; chat platforms treat them as one group"
        );
    }
    Ok(schedules)
}

/// Pairs of current-group names that are equal ignoring ASCII case, in schedule order.
fn case_only_collisions(schedules: &[Schedule]) -> Vec<(String, String)> {
    let mut first_by_folded: HashMap<String, &str> = HashMap::new();
    let mut collisions = Vec::new();
    for schedule in schedules {
        let name = schedule.current_group.name.as_str();
        match first_by_folded.get(&name.to_ascii_lowercase()) {
            Some(first) => collisions.push(((*first).to_string(), name.to_string())),
            None => {
                first_by_folded.insert(name.to_ascii_lowercase(), name);
            }
        }
    }
    collisions
}

fn declaration_templates(
    declaration: &RawDeclaration,
    templates: &NameTemplates,
) -> Result<NameTemplates, ConfigError> {
    let effective = NameTemplates {
        current: declaration
            .current_name_format
            .clone()
            .unwrap_or_else(|| templates.current.clone()),
        all: declaration
            .all_name_format
            .clone()
            .unwrap_or_else(|| templates.all.clone()),
    };
    effective.validate()?;
    Ok(effective)
}
