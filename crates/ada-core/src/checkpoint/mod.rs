//! Checkpoint ("seal") persistence.
//!
//! A checkpoint is a best-effort snapshot of the node set and the newest log
//! entries. Absence of a checkpoint is not an error.

mod file;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::error::Result;
use crate::logs::LogEntry;
use crate::nodes::Node;

pub use file::JsonFileCheckpointStore;

/// Persisted node and log state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    /// Newest first.
    pub logs: Vec<LogEntry>,
}

impl Snapshot {
    pub fn new(saved_at: DateTime<Utc>, nodes: Vec<Node>, logs: Vec<LogEntry>) -> Self {
        Self { id: Uuid::new_v4().to_string(), saved_at, nodes, logs }
    }
}

/// Key-value persistence boundary for a single snapshot.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Overwrites the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Returns the stored snapshot, or `None` if nothing was saved.
    async fn load(&self) -> Result<Option<Snapshot>>;
}

/// Process-local store; counts saves so callers can observe sealing.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    slot: Mutex<Option<Snapshot>>,
    saves: AtomicUsize,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeStatus;

    fn snapshot() -> Snapshot {
        let mut node = Node::new("travel_agent", "Travel Agent", "travel_agent");
        node.status = NodeStatus::Sealing;
        Snapshot::new(Utc::now(), vec![node], Vec::new())
    }

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let store = InMemoryCheckpointStore::new();
        let saved = snapshot();
        store.save(&saved).await.unwrap();

        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Some(saved));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = InMemoryCheckpointStore::new();
        store.save(&snapshot()).await.unwrap();
        let latest = snapshot();
        store.save(&latest).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap().id, latest.id);
        assert_eq!(store.save_count(), 2);
    }
}
