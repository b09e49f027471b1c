//! Error types for configuration loading and sync passes.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration failures. All of them abort startup before any sync pass runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No rotation declaration survived loading.
    #[error(
        "expecting at least one schedule defined as an env var using prefix SCHEDULE_ or under user-groups"
    )]
    NoSchedulesConfigured,

    /// A declaration is missing its rotation id or team label.
    #[error("malformed schedule declaration `{value}`: {reason}")]
    MalformedDeclaration { value: String, reason: String },

    /// Group selector token is neither `all` nor `current`.
    #[error("unknown group identifier `{token}` in `{selector}`, expected either all or current")]
    InvalidGroupSelector { selector: String, token: String },

    /// Group selector names the same group twice.
    #[error("duplicate group identifier `{token}` in `{selector}`")]
    DuplicateGroupSelector { selector: String, token: String },

    /// Name template without exactly one `%s` placeholder.
    #[error("group name format `{format}` must contain exactly one %s placeholder")]
    InvalidNameFormat { format: String },

    /// A required credential is absent or blank.
    #[error("{0} is required")]
    MissingToken(&'static str),

    /// Run interval is not a positive integer.
    #[error("run interval must be a positive number of seconds, got `{0}`")]
    InvalidRunInterval(String),

    /// Lookahead is not a duration string.
    #[error("failed to parse schedule lookahead `{value}` as a duration: {source}")]
    InvalidLookahead {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    /// Config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected shape.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failures raised while talking to the on-call service or the chat platform.
///
/// Everything except [`SyncError::ClientInit`] is scoped to one group branch of one
/// schedule: it is logged and the pass moves on.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The on-call service could not be reached or rejected the request.
    #[error("on-call lookup for rotation {rotation_id} failed: {message}")]
    UpstreamUnavailable {
        rotation_id: String,
        message: String,
    },

    /// On-call people without a matching chat account.
    #[error("could not find chat users with email: {}", emails.join(", "))]
    UnknownIdentity { emails: Vec<String> },

    /// Group creation raced with another creator and the group is still not visible.
    #[error("group {group} could not be created or found: {message}")]
    GroupCreateConflict { group: String, message: String },

    /// Reading chat-platform state failed (transport error, 5xx, unexpected response).
    #[error("chat platform request {operation} failed: {message}")]
    ChatUnavailable {
        operation: &'static str,
        message: String,
    },

    /// The chat platform rejected a membership update.
    #[error("membership update for group {group} failed: {message}")]
    WriteFailure { group: String, message: String },

    /// A client could not be constructed: blank token or credentials rejected by the API.
    #[error("failed to initialise {client} client: {message}")]
    ClientInit {
        client: &'static str,
        message: String,
    },
}

impl SyncError {
    /// Whether this error must stop the run loop instead of being skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ClientInit { .. })
    }
}
