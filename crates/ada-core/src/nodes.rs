//! Runtime-visible nodes: the coordinator, the agents and their clones.
//!
//! Nodes are created at startup from the catalog and by explicit clone
//! actions. They are mutated as tasks progress and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::events::{AdaEvent, EventBus};

/// Identifier (and type tag) of the central coordinator.
pub const CENTRAL_NODE_ID: &str = "ada.central";

const CENTRAL_NODE_NAME: &str = "Ada Coordinator";
const MAIN_INSTANCE: &str = "Main";

/// Node status as rendered by presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    Processing,
    Sealing,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Processing => "processing",
            Self::Sealing => "sealing",
        };
        f.write_str(s)
    }
}

/// A runtime actor shown in the node graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            status: NodeStatus::Online,
            instance_name: None,
            last_active: None,
            current_task: None,
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance_name = Some(instance.into());
        self
    }
}

/// Turns `travel_agent` into `Travel Agent`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Lowercases and turns every whitespace character into `-`.
fn slug(instance: &str) -> String {
    instance.to_lowercase().chars().map(|c| if c.is_whitespace() { '-' } else { c }).collect()
}

/// Ordered, shared node map.
pub struct NodeRegistry {
    nodes: RwLock<Vec<Node>>,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry").field("nodes", &self.list()).finish_non_exhaustive()
    }
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new(clock: Arc<dyn Clock>, bus: EventBus) -> Self {
        Self { nodes: RwLock::new(Vec::new()), clock, bus }
    }

    /// Coordinator plus one `Main` node per agent module, in catalog order.
    pub fn from_catalog(catalog: &Catalog, clock: Arc<dyn Clock>, bus: EventBus) -> Self {
        let registry = Self::new(clock, bus);
        registry.insert(Node::new(CENTRAL_NODE_ID, CENTRAL_NODE_NAME, CENTRAL_NODE_ID));
        for agent_id in catalog.module_ids() {
            registry.insert(
                Node::new(agent_id, title_case(agent_id), agent_id).with_instance(MAIN_INSTANCE),
            );
        }
        registry
    }

    /// Adds a node, replacing any node with the same id.
    pub fn insert(&self, node: Node) {
        {
            let mut nodes = self.write();
            if let Some(existing) = nodes.iter_mut().find(|n| n.id == node.id) {
                *existing = node.clone();
            } else {
                nodes.push(node.clone());
            }
        }
        self.bus.publish(AdaEvent::NodeAdded { node });
    }

    /// Creates a new online instance of `node_type`.
    ///
    /// Ids are `<type>.<slug>-<millis>`; a clone landing on a taken id gets a
    /// `-2`, `-3`, ... suffix so an existing node is never replaced.
    pub fn clone_node(&self, node_type: &str, instance_name: &str) -> Node {
        let millis = self.clock.now().timestamp_millis();
        let base_id = format!("{node_type}.{}-{millis}", slug(instance_name));
        let name = title_case(&format!("{node_type} {instance_name}"));

        let node = {
            let mut nodes = self.write();
            let mut id = base_id.clone();
            let mut suffix = 2;
            while nodes.iter().any(|n| n.id == id) {
                id = format!("{base_id}-{suffix}");
                suffix += 1;
            }
            let node = Node::new(id, name, node_type).with_instance(instance_name);
            nodes.push(node.clone());
            node
        };

        debug!(node_id = %node.id, "Cloned node");
        self.bus.publish(AdaEvent::NodeAdded { node: node.clone() });
        node
    }

    /// Sets the status of a node; returns false if the node is unknown.
    pub fn set_status(&self, node_id: &str, status: NodeStatus) -> bool {
        let now = self.clock.now();
        let found = {
            let mut nodes = self.write();
            nodes.iter_mut().find(|n| n.id == node_id).map(|node| {
                node.status = status;
                node.last_active = Some(now);
            })
        };
        if found.is_some() {
            self.bus.publish(AdaEvent::NodeStatusChanged { node_id: node_id.to_string(), status });
        }
        found.is_some()
    }

    /// Sets the status and current task label of a node.
    pub fn set_task(&self, node_id: &str, status: NodeStatus, task: Option<String>) -> bool {
        {
            let mut nodes = self.write();
            if let Some(node) = nodes.iter_mut().find(|n| n.id == node_id) {
                node.current_task = task;
            }
        }
        self.set_status(node_id, status)
    }

    pub fn get(&self, node_id: &str) -> Option<Node> {
        self.read().iter().find(|n| n.id == node_id).cloned()
    }

    pub fn status_of(&self, node_id: &str) -> Option<NodeStatus> {
        self.read().iter().find(|n| n.id == node_id).map(|n| n.status)
    }

    /// All nodes in insertion order.
    pub fn list(&self) -> Vec<Node> {
        self.read().clone()
    }

    /// Replaces every node, e.g. from a checkpoint.
    pub fn replace(&self, nodes: Vec<Node>) {
        *self.write() = nodes.clone();
        for node in nodes {
            self.bus.publish(AdaEvent::NodeAdded { node });
        }
    }

    /// Agent nodes (everything except the coordinator) that are not offline.
    pub fn active_agent_count(&self) -> usize {
        self.read()
            .iter()
            .filter(|n| n.id != CENTRAL_NODE_ID && n.status != NodeStatus::Offline)
            .count()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Node>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Node>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }
}
