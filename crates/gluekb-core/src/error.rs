//! Run-level error taxonomy
//!
//! Every stage error converts into [`HarvestError`], and the top level turns
//! it into a single error result carrying only the message.

use crate::config::ConfigError;

/// Errors that abort a harvest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarvestError {
    /// A required configuration value is absent; raised before any service call
    #[error("{0}")]
    ConfigurationMissing(String),

    /// A listing or detail call to the catalog or query service failed
    #[error("{0}")]
    SourceUnavailable(String),

    /// Writing a snapshot to the sink failed
    #[error("failed to write {key}: {message}")]
    SinkWriteFailure { key: String, message: String },

    /// A table name could not be turned into a match pattern
    #[error("invalid match pattern for table '{table}': {message}")]
    InvalidPattern { table: String, message: String },
}

impl From<ConfigError> for HarvestError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigurationMissing(err.to_string())
    }
}
