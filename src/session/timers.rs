//! Slot timers for the controller
//!
//! Each slot holds at most one sleeping task. Re-arming or cancelling a slot
//! aborts the previous task, and a firing that raced the abort is rejected
//! by its generation.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::cycle::TimerSlot;

/// A timer went off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub slot: TimerSlot,
    pub generation: u64,
}

struct Armed {
    generation: u64,
    task: JoinHandle<()>,
}

/// Timer slots delivering firings over a channel
pub struct Timers {
    tx: mpsc::UnboundedSender<TimerFired>,
    armed: HashMap<TimerSlot, Armed>,
    generation: u64,
}

impl Timers {
    /// Create timers that report to `tx`
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            tx,
            armed: HashMap::new(),
            generation: 0,
        }
    }

    /// Arm `slot` to fire after `delay`, replacing any pending timer there
    pub fn arm(&mut self, slot: TimerSlot, delay: Duration) {
        self.cancel(slot);
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired { slot, generation });
        });

        tracing::trace!(?slot, generation, delay_ms = delay.as_millis(), "timer armed");
        self.armed.insert(slot, Armed { generation, task });
    }

    /// Cancel `slot`; a no-op if nothing is armed there
    pub fn cancel(&mut self, slot: TimerSlot) {
        if let Some(armed) = self.armed.remove(&slot) {
            armed.task.abort();
            tracing::trace!(?slot, generation = armed.generation, "timer cancelled");
        }
    }

    /// Cancel every slot
    pub fn cancel_all(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.task.abort();
        }
    }

    /// Accept a firing if it belongs to the live timer of its slot
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        match self.armed.get(&fired.slot) {
            Some(armed) if armed.generation == fired.generation => {
                self.armed.remove(&fired.slot);
                true
            }
            _ => {
                tracing::trace!(slot = ?fired.slot, generation = fired.generation, "stale timer firing dropped");
                false
            }
        }
    }

    /// Number of armed slots
    #[must_use]
    pub fn pending(&self) -> usize {
        self.armed.len()
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
