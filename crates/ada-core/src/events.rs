//! Observable state changes for presentation layers.
//!
//! Any UI (terminal, web, TUI) subscribes to the bus and renders node status,
//! the activity log, the processing flag and connection sets from it.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::logs::LogEntry;
use crate::nodes::{Node, NodeStatus};

/// A directed coordinator-to-node edge.
pub type Connection = (String, String);

/// State change emitted by the core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdaEvent {
    /// A node changed status.
    NodeStatusChanged {
        node_id: String,
        status: NodeStatus,
    },
    /// A node was created (startup, clone or restore).
    NodeAdded {
        node: Node,
    },
    /// A log entry was appended.
    LogAppended {
        entry: LogEntry,
    },
    /// The log was replaced wholesale (restore or clear).
    LogReset {
        len: usize,
    },
    /// The single task slot was taken or released.
    ProcessingChanged {
        processing: bool,
    },
    /// Active and failed connections changed.
    ConnectionsChanged {
        active: Vec<Connection>,
        errors: Vec<Connection>,
    },
}

/// Broadcast channel wrapper; publishing without subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AdaEvent>,
}

impl EventBus {
    /// Creates a bus that buffers up to `capacity` events per lagging receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: AdaEvent) {
        // No receivers is the normal headless case.
        let _ = self.sender.send(event);
    }

    /// Subscribes to subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<AdaEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(AdaEvent::ProcessingChanged { processing: true });

        match rx.recv().await.unwrap() {
            AdaEvent::ProcessingChanged { processing } => assert!(processing),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(AdaEvent::LogReset { len: 0 });
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AdaEvent::NodeStatusChanged {
            node_id: "travel_agent".to_string(),
            status: NodeStatus::Sealing,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node_status_changed");
        assert_eq!(json["status"], "sealing");
    }
}
