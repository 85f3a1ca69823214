//! Local directory sink
//!
//! Writes each key as a file below a root directory, creating parent
//! directories as needed. Used for offline replays where the output should
//! mirror the bucket layout on disk.

use crate::sink::{SinkError, SnapshotSink};
use std::path::{Component, Path, PathBuf};

/// Sink that stores objects as files under `root`
#[derive(Debug, Clone)]
pub struct LocalDirectorySink {
    root: PathBuf,
}

impl LocalDirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root
    ///
    /// Keys must be relative and may not climb out of the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, SinkError> {
        let relative = Path::new(key);
        let escapes = key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));

        if escapes {
            return Err(SinkError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl SnapshotSink for LocalDirectorySink {
    fn name(&self) -> &'static str {
        "LocalDirectory"
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SinkError> {
        let path = self.path_for(key)?;

        let write_error = |e: std::io::Error| SinkError::Write {
            key: key.to_string(),
            message: format!("{}: {}", path.display(), e),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        tokio::fs::write(&path, body).await.map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirectorySink::new(dir.path());

        sink.put_object("AwsDataCatalog/sales.json", b"[]".to_vec())
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("AwsDataCatalog/sales.json")).unwrap();
        assert_eq!(written, b"[]");
    }

    #[tokio::test]
    async fn overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalDirectorySink::new(dir.path());

        sink.put_object("k.json", b"old".to_vec()).await.unwrap();
        sink.put_object("k.json", b"new".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("k.json")).unwrap(), b"new");
    }

    #[test]
    fn rejects_keys_outside_root() {
        let sink = LocalDirectorySink::new("/tmp/out");

        assert!(matches!(sink.path_for("../x.json"), Err(SinkError::InvalidKey(_))));
        assert!(matches!(sink.path_for("/etc/x.json"), Err(SinkError::InvalidKey(_))));
        assert!(matches!(sink.path_for(""), Err(SinkError::InvalidKey(_))));
        assert_eq!(
            sink.path_for("a/b.json").unwrap(),
            PathBuf::from("/tmp/out/a/b.json")
        );
    }
}
