//! Single task slot.
//!
//! Only one task runs system-wide. Submissions while the slot is held are
//! rejected with [`OrchestrationError::Busy`], not queued.

use ada_core::{AdaEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::{OrchestrationError, Result};

/// Try-acquire gate for the running task.
#[derive(Debug)]
pub struct TaskSlot {
    busy: AtomicBool,
    bus: EventBus,
}

impl TaskSlot {
    pub fn new(bus: EventBus) -> Self {
        Self { busy: AtomicBool::new(false), bus }
    }

    /// Takes the slot; the returned guard releases it on drop.
    pub fn try_acquire(&self) -> Result<SlotGuard<'_>> {
        if self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!("Task slot busy, rejecting submission");
            return Err(OrchestrationError::Busy);
        }
        self.bus.publish(AdaEvent::ProcessingChanged { processing: true });
        Ok(SlotGuard { slot: self })
    }

    /// The processing flag.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the task slot until dropped.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a TaskSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
        self.slot.bus.publish(AdaEvent::ProcessingChanged { processing: false });
    }
}
