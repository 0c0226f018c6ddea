//! Per-name write locks
//!
//! The FortiSASE API has no optimistic concurrency token, so two writes to
//! related objects can silently overwrite each other. Resources that are
//! prone to this take a named lock around their write and the read that
//! confirms it.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock named `name`, creating it on first use. The lock is
    /// released when the guard is dropped.
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(name.to_string()).or_default().clone()
        };
        tracing::debug!("waiting for lock {}", name);
        let guard = lock.lock_owned().await;
        tracing::debug!("acquired lock {}", name);
        guard
    }

    /// Number of names that have been locked at least once
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
