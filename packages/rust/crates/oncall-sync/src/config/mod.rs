//! Config namespace: canonical model, declaration aggregation and layered settings.

mod aggregate;
mod model;
mod settings;

pub use aggregate::{
    DEFAULT_ALL_NAME_FORMAT, DEFAULT_CURRENT_NAME_FORMAT, DEFAULT_GROUP_NAME_PREFIX,
    GroupSelector, NameTemplates, RawDeclaration, aggregate,
};
pub use model::{Config, GroupConfig, GroupKind, Schedule};
pub use settings::{
    DEFAULT_RUN_INTERVAL_SECS, DEFAULT_SCHEDULE_LOOKAHEAD, SyncSettings, UserGroupSettings,
    load_settings, parse_schedule_declaration,
};
