use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Malformed configuration. Always fatal, always before analysis starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid issue kind: {0}")]
    InvalidIssueKind(String),

    #[error("configuration is not an object")]
    NotAnObject,
}
