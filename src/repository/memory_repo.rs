//! In-memory Checklist Repository
//!
//! Keeps every user's rows in a map behind one lock. A mutation works on a
//! copy of the user's rows and only replaces them once it succeeded, which
//! gives the same all-or-nothing behaviour as the SQLite transaction.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::mutation::{Checklist, Mutation, MutationOutcome};
use super::traits::AggregateStore;
use crate::domain::{AggregateRow, DesignId, DomainResult, ItemId, UserId};

#[derive(Default)]
pub struct MemoryChecklistRepository {
    users: Mutex<HashMap<UserId, BTreeMap<ItemId, AggregateRow>>>,
}

impl MemoryChecklistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStore for MemoryChecklistRepository {
    async fn apply(&self, user_id: UserId, mutation: Mutation, now: i64) -> DomainResult<MutationOutcome> {
        let mut users = self.users.lock().await;

        let current = users.get(&user_id).map(|rows| rows.values().cloned().collect::<Vec<_>>());
        let mut checklist = Checklist::new(user_id, current.unwrap_or_default());
        let outcome = checklist.apply(&mutation, now)?;

        if checklist.is_empty() {
            users.remove(&user_id);
        } else {
            users.insert(user_id, checklist.into_rows());
        }
        Ok(outcome)
    }

    async fn list(&self, user_id: UserId) -> DomainResult<Vec<AggregateRow>> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(&self, user_id: UserId, item_id: ItemId) -> DomainResult<Option<AggregateRow>> {
        let users = self.users.lock().await;
        Ok(users.get(&user_id).and_then(|rows| rows.get(&item_id)).cloned())
    }

    async fn contains_design(&self, user_id: UserId, design_id: DesignId) -> DomainResult<bool> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user_id)
            .map(|rows| rows.values().any(|row| row.has_design(design_id)))
            .unwrap_or(false))
    }
}
