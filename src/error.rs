use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors surfaced by the config manager and its codec.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The persistence adapter failed. The adapter's error is passed through as-is.
    #[error(transparent)]
    Storage(anyhow::Error),

    /// Stored bytes did not parse into a complete client config record.
    #[error("Failed to decode client config: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode client config: {0}")]
    Encode(#[source] serde_json::Error),

    /// Exactly one of access key / secret key is set.
    #[error("Incomplete client credentials: {missing} is empty while {present} is set")]
    IncompleteCredentials {
        missing: &'static str,
        present: &'static str,
    },

    #[error("Unknown client config field: {0:?}")]
    UnknownField(String),
}
