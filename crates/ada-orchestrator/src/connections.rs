//! Coordinator-to-agent edges shown in the node graph.

use ada_core::events::Connection;
use ada_core::{AdaEvent, EventBus};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default, Clone)]
struct Edges {
    active: Vec<Connection>,
    errors: Vec<Connection>,
}

/// Active and failed connections of the current task.
#[derive(Debug)]
pub struct ConnectionSet {
    edges: Mutex<Edges>,
    bus: EventBus,
}

impl ConnectionSet {
    pub fn new(bus: EventBus) -> Self {
        Self { edges: Mutex::new(Edges::default()), bus }
    }

    pub fn add_active(&self, from: &str, to: &str) {
        self.update(|edges| push_unique(&mut edges.active, from, to));
    }

    pub fn add_error(&self, from: &str, to: &str) {
        self.update(|edges| push_unique(&mut edges.errors, from, to));
    }

    pub fn clear_active(&self) {
        self.update(|edges| edges.active.clear());
    }

    pub fn clear_errors(&self) {
        self.update(|edges| edges.errors.clear());
    }

    pub fn active(&self) -> Vec<Connection> {
        self.lock().active.clone()
    }

    pub fn errors(&self) -> Vec<Connection> {
        self.lock().errors.clone()
    }

    fn update(&self, change: impl FnOnce(&mut Edges)) {
        let snapshot = {
            let mut edges = self.lock();
            change(&mut edges);
            edges.clone()
        };
        self.bus.publish(AdaEvent::ConnectionsChanged {
            active: snapshot.active,
            errors: snapshot.errors,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Edges> {
        self.edges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_unique(list: &mut Vec<Connection>, from: &str, to: &str) {
    if !list.iter().any(|(f, t)| f == from && t == to) {
        list.push((from.to_string(), to.to_string()));
    }
}
