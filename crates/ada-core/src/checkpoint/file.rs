use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{CheckpointStore, Snapshot};
use crate::error::Result;

/// Stores the snapshot as a JSON file, written atomically via rename.
#[derive(Debug, Clone)]
pub struct JsonFileCheckpointStore {
    path: PathBuf,
}

impl JsonFileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for JsonFileCheckpointStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), snapshot_id = %snapshot.id, "Checkpoint written");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::logs::{LogEntry, LogType};
    use crate::nodes::Node;
    use chrono::Utc;

    fn snapshot() -> Snapshot {
        let entry = LogEntry {
            id: 3,
            timestamp: Utc::now(),
            log_type: LogType::Success,
            message: "Task completed.".to_string(),
            source: Some("MCP".to_string()),
            vote_distribution: None,
            request_id: None,
            response_time_ms: None,
            direction: None,
        };
        Snapshot::new(
            Utc::now(),
            vec![Node::new("ada.central", "Ada Coordinator", "ada.central")],
            vec![entry],
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("checkpoint.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_twice() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("nested/checkpoint.json"));
        let saved = snapshot();
        store.save(&saved).await.unwrap();

        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();
        assert_eq!(first, Some(saved));
        assert_eq!(first, second);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonFileCheckpointStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
