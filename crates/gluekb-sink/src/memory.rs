//! In-memory sink for tests and dry runs
//!
//! Objects live in a shared map; clones of a `MemorySink` see the same
//! objects, so a test can hand one clone to the harvester and inspect the
//! other afterwards.
//!
//! ```rust,ignore
//! let sink = MemorySink::new("kb-bucket").with_failure_on("AwsDataCatalog/sales.json");
//! ```

use crate::sink::{SinkError, SnapshotSink};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sink that keeps objects in memory
#[derive(Debug, Clone)]
pub struct MemorySink {
    bucket: String,

    /// Stored objects by key
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,

    /// Keys whose puts fail
    failing_keys: Arc<HashSet<String>>,

    /// Number of put attempts, failed ones included
    puts: Arc<AtomicUsize>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            failing_keys: Arc::new(HashSet::new()),
            puts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every put to `key` fail
    pub fn with_failure_on(mut self, key: impl Into<String>) -> Self {
        let mut keys = (*self.failing_keys).clone();
        keys.insert(key.into());
        self.failing_keys = Arc::new(keys);
        self
    }

    /// Read an object back
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    /// Read an object back as UTF-8 text
    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .await
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Read an object back as parsed JSON
    pub async fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        self.get(key)
            .await
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Copy of every stored object
    pub async fn objects(&self) -> BTreeMap<String, Vec<u8>> {
        self.objects.read().await.clone()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Number of put attempts so far
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotSink for MemorySink {
    fn name(&self) -> &'static str {
        "Memory"
    }

    fn location(&self) -> String {
        format!("memory://{}", self.bucket)
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SinkError> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        if self.failing_keys.contains(key) {
            return Err(SinkError::Write {
                key: key.to_string(),
                message: "Simulated write failure".to_string(),
            });
        }

        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }
}
