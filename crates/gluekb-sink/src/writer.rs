//! Snapshot writer
//!
//! Renders payloads as JSON with two-space indentation and hands the bytes to
//! a sink. The rendering is a pure function of the payload, so writing the
//! same snapshot twice produces the same bytes under the same key.

use crate::sink::{SinkError, SnapshotSink};
use gluekb_core::Snapshot;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Summary of one successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub key: String,

    /// Size of the rendered payload
    pub bytes: usize,

    /// Hex SHA-256 of the rendered payload
    pub sha256: String,
}

/// Serializes payloads and writes them to a sink
#[derive(Clone)]
pub struct SnapshotWriter {
    sink: Arc<dyn SnapshotSink>,
}

impl SnapshotWriter {
    pub fn new(sink: Arc<dyn SnapshotSink>) -> Self {
        Self { sink }
    }

    /// Where the underlying sink writes
    pub fn location(&self) -> String {
        self.sink.location()
    }

    /// Render a payload exactly as it will be stored
    pub fn render<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(payload)
    }

    /// Render `payload` and store it under `key`, replacing any existing object
    pub async fn write<T>(&self, key: &str, payload: &T) -> Result<WriteReceipt, SinkError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let body = Self::render(payload).map_err(|e| SinkError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let receipt = WriteReceipt {
            key: key.to_string(),
            bytes: body.len(),
            sha256: hex::encode(Sha256::digest(&body)),
        };

        if let Err(err) = self.sink.put_object(key, body).await {
            tracing::error!(key, sink = self.sink.name(), error = %err, "snapshot write failed");
            return Err(err);
        }

        tracing::debug!(
            key,
            bytes = receipt.bytes,
            sha256 = %receipt.sha256,
            "wrote snapshot to {}",
            self.sink.location()
        );

        Ok(receipt)
    }

    /// Write a snapshot under its own key
    pub async fn write_snapshot<S>(&self, snapshot: &S) -> Result<WriteReceipt, SinkError>
    where
        S: Snapshot + Sync,
    {
        self.write(&snapshot.key(), snapshot).await
    }
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("sink", &self.sink.name())
            .field("location", &self.sink.location())
            .finish()
    }
}
