//! Sink trait for storing rendered snapshots

use gluekb_core::HarvestError;

/// Errors that can occur when storing a snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("Serialization failed for {key}: {message}")]
    Serialize { key: String, message: String },

    #[error("Write failed for {key}: {message}")]
    Write { key: String, message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl SinkError {
    /// Key the failed operation targeted
    pub fn key(&self) -> &str {
        match self {
            Self::Serialize { key, .. } | Self::Write { key, .. } => key,
            Self::InvalidKey(key) => key,
        }
    }

    /// Error text without the key
    pub fn message(&self) -> String {
        match self {
            Self::Serialize { message, .. } | Self::Write { message, .. } => message.clone(),
            Self::InvalidKey(key) => format!("invalid key '{}'", key),
        }
    }
}

impl From<SinkError> for HarvestError {
    fn from(err: SinkError) -> Self {
        HarvestError::SinkWriteFailure {
            key: err.key().to_string(),
            message: err.message(),
        }
    }
}

/// Object store that snapshots are written to
///
/// Puts overwrite any existing object at the same key. There is no
/// transaction across puts: an earlier successful put stays in place when a
/// later one fails.
#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Sink kind (e.g. "Memory", "LocalDirectory")
    fn name(&self) -> &'static str;

    /// Bucket or root the sink writes under, for logging
    fn location(&self) -> String;

    /// Store `body` under `key`
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_sink_write_failure() {
        let err = SinkError::Write {
            key: "athena_saved_queries/primary.json".to_string(),
            message: "throttled".to_string(),
        };

        match HarvestError::from(err) {
            HarvestError::SinkWriteFailure { key, message } => {
                assert_eq!(key, "athena_saved_queries/primary.json");
                assert_eq!(message, "throttled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_key_message() {
        let err = SinkError::InvalidKey("../escape.json".to_string());
        assert_eq!(err.key(), "../escape.json");
        assert!(err.message().contains("invalid key"));
    }
}
