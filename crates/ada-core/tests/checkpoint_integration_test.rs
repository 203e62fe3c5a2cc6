//! Integration tests for sealing node and log state into a checkpoint file.

use ada_core::{
    Catalog, CheckpointStore, Clock, EventBus, JsonFileCheckpointStore, LogBook, LogType,
    ManualClock, NodeRegistry, NodeStatus, Snapshot,
};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_snapshot_round_trip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let bus = EventBus::default();

    let nodes = NodeRegistry::from_catalog(&Catalog::builtin(), Arc::clone(&clock), bus.clone());
    let log = LogBook::new(50, Arc::clone(&clock), bus);
    nodes.set_status("travel_agent", NodeStatus::Sealing);
    nodes.clone_node("maritime_agent", "Gocek");
    log.log(LogType::Info, "Task injected", "Observer");
    log.log(LogType::Success, "Flight booked", "Coordinator");

    let store = JsonFileCheckpointStore::new(temp_dir.path().join("ada").join("checkpoint.json"));
    assert!(store.load().await.unwrap().is_none());

    let snapshot = Snapshot::new(clock.now(), nodes.list(), log.recent(10));
    store.save(&snapshot).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.nodes.len(), 6);
    assert_eq!(loaded.logs[0].message, "Flight booked");

    // a fresh book continues numbering after the restored entries
    let restored = LogBook::new(50, Arc::clone(&clock), EventBus::default());
    restored.replace(loaded.logs);
    let next = restored.log(LogType::Info, "State restored", "System");
    assert!(next.id > restored.entries()[1].id);
    assert_eq!(restored.len(), 3);
}

#[tokio::test]
async fn test_later_save_overwrites() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileCheckpointStore::new(temp_dir.path().join("checkpoint.json"));
    let clock = ManualClock::new();

    let first = Snapshot::new(clock.now(), Vec::new(), Vec::new());
    let second = Snapshot::new(clock.now(), Vec::new(), Vec::new());
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    assert_eq!(store.load().await.unwrap().unwrap().id, second.id);
    assert!(!temp_dir.path().join("checkpoint.tmp").exists());
}
