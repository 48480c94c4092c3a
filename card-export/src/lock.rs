//! Per-container serialization.
//!
//! Exports against the same container would fight over its face and its
//! controls, so each container gets its own async mutex. Different
//! containers never block each other. A container's entry lives only as
//! long as someone holds or waits for its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Registry of per-container async locks.
#[derive(Debug, Default)]
pub struct TargetLocks {
    locks: Mutex<HashMap<String, Slot>>,
}

/// Exclusive access to one container. Dropping it releases the lock.
#[derive(Debug)]
pub struct TargetGuard<'a> {
    registry: &'a TargetLocks,
    target: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TargetLocks {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `target`.
    pub async fn acquire(&self, target: &str) -> TargetGuard<'_> {
        let slot = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(target.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        TargetGuard {
            registry: self,
            target: target.to_string(),
            guard: Some(slot.lock_owned().await),
        }
    }

    /// Number of containers currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if no container is locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget `target` if only the registry still refers to its lock.
    fn prune(&self, target: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(target).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            locks.remove(target);
        }
    }
}

impl Drop for TargetGuard<'_> {
    fn drop(&mut self) {
        // Release first so the registry holds the last reference
        drop(self.guard.take());
        self.registry.prune(&self.target);
    }
}
