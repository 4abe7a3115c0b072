//! Per-operation busy flags.
//!
//! Each operation class may run once per target at a time. Different
//! operations, or the same operation on different targets, run freely.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Target used by operations that span every entry.
pub const ALL_ENTRIES: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    Analyze,
    Export,
    Autofill,
}

type Key = (Operation, String);

#[derive(Debug, Clone, Default)]
pub struct BusySet {
    running: Arc<Mutex<HashSet<Key>>>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `operation` running on `target`. Returns `None` if it already is.
    pub fn try_acquire(&self, operation: Operation, target: &str) -> Option<BusyGuard> {
        let key = (operation, target.to_string());
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(key.clone()) {
            return None;
        }
        Some(BusyGuard {
            set: self.clone(),
            key,
        })
    }

    pub fn is_busy(&self, operation: Operation, target: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(operation, target.to_string()))
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    set: BusySet,
    key: Key,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.set
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
