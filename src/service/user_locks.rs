//! Per-user Mutation Locks
//!
//! Mutations of one user run one at a time; different users never wait on
//! each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::UserId;

#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one user's checklist
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only referenced by the map are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users with a held or awaited lock
    pub async fn active(&self) -> usize {
        let locks = self.locks.lock().await;
        locks.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}
