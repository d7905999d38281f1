//! Checklist Engine
//!
//! Entry point for every checklist operation. Writes go through the store's
//! `apply`, serialized per user; reads see committed state and are enriched
//! with catalog metadata on the way out.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::user_locks::UserLocks;
use crate::domain::{
    group_by_design, AggregateRow, ChecklistEntry, DesignGroup, DesignId, DomainError, DomainResult,
    ItemId, ItemMetadata, ListSummary, UserId,
};
use crate::gateway::{DesignSource, ItemCatalog};
use crate::repository::{AggregateStore, Mutation, MutationOutcome};

/// Result of `add_design`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignAdded {
    pub design_id: DesignId,
    pub title: String,
    /// Rows created, updated or deleted
    pub affected: usize,
    /// The design resolved but lists no items; nothing was changed
    pub empty_design: bool,
}

pub struct ChecklistEngine {
    store: Arc<dyn AggregateStore>,
    designs: Arc<dyn DesignSource>,
    catalog: Arc<dyn ItemCatalog>,
    locks: UserLocks,
}

impl ChecklistEngine {
    pub fn new(
        store: Arc<dyn AggregateStore>,
        designs: Arc<dyn DesignSource>,
        catalog: Arc<dyn ItemCatalog>,
    ) -> Self {
        Self {
            store,
            designs,
            catalog,
            locks: UserLocks::new(),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn mutate(&self, user_id: UserId, mutation: Mutation) -> DomainResult<MutationOutcome> {
        let _guard = self.locks.acquire(user_id).await;
        self.apply_locked(user_id, mutation).await
    }

    /// Caller must hold the user's lock
    async fn apply_locked(&self, user_id: UserId, mutation: Mutation) -> DomainResult<MutationOutcome> {
        let name = mutation.name();
        let outcome = self.store.apply(user_id, mutation, Self::now()).await?;
        log::info!("{} user={} affected={}", name, user_id, outcome.affected);
        Ok(outcome)
    }

    /// Merge a design's items into the user's checklist
    ///
    /// Re-adding a design whose contributions already match its items changes
    /// nothing. Items removed with `remove_item` are re-created.
    pub async fn add_design(&self, user_id: UserId, design_id: DesignId) -> DomainResult<DesignAdded> {
        let _guard = self.locks.acquire(user_id).await;

        let snapshot = self
            .designs
            .design_snapshot(design_id)
            .await?
            .ok_or(DomainError::DesignNotFound(design_id))?;
        let items = snapshot.normalized_items()?;

        if items.is_empty() {
            log::info!("add_design user={} design={} has no items", user_id, design_id);
            return Ok(DesignAdded {
                design_id,
                title: snapshot.title,
                affected: 0,
                empty_design: true,
            });
        }

        let outcome = self
            .apply_locked(user_id, Mutation::AddDesign { design_id, items })
            .await?;

        Ok(DesignAdded {
            design_id,
            title: snapshot.title,
            affected: outcome.affected,
            empty_design: false,
        })
    }

    /// Withdraw a design from every row; returns the rows updated or deleted
    pub async fn remove_design(&self, user_id: UserId, design_id: DesignId) -> DomainResult<usize> {
        let outcome = self.mutate(user_id, Mutation::RemoveDesign { design_id }).await?;
        Ok(outcome.affected)
    }

    /// Set the acquired count; out-of-range values are clamped
    pub async fn set_acquired(&self, user_id: UserId, item_id: ItemId, quantity: i64) -> DomainResult<AggregateRow> {
        let outcome = self
            .mutate(user_id, Mutation::SetAcquired { item_id, quantity })
            .await?;
        outcome.row.ok_or(DomainError::ItemNotFound(item_id))
    }

    pub async fn toggle_complete(&self, user_id: UserId, item_id: ItemId) -> DomainResult<AggregateRow> {
        let outcome = self.mutate(user_id, Mutation::ToggleComplete { item_id }).await?;
        outcome.row.ok_or(DomainError::ItemNotFound(item_id))
    }

    /// Delete a row with all its provenance; false if there was none
    pub async fn remove_item(&self, user_id: UserId, item_id: ItemId) -> DomainResult<bool> {
        let outcome = self.mutate(user_id, Mutation::RemoveItem { item_id }).await?;
        Ok(outcome.affected > 0)
    }

    pub async fn clear_completed(&self, user_id: UserId) -> DomainResult<usize> {
        let outcome = self.mutate(user_id, Mutation::ClearCompleted).await?;
        Ok(outcome.affected)
    }

    pub async fn clear_all(&self, user_id: UserId) -> DomainResult<usize> {
        let outcome = self.mutate(user_id, Mutation::ClearAll).await?;
        Ok(outcome.affected)
    }

    pub async fn is_design_in_list(&self, user_id: UserId, design_id: DesignId) -> DomainResult<bool> {
        self.store.contains_design(user_id, design_id).await
    }

    pub async fn get_item(&self, user_id: UserId, item_id: ItemId) -> DomainResult<Option<AggregateRow>> {
        self.store.find(user_id, item_id).await
    }

    /// All rows with catalog metadata, by item id
    pub async fn get_list(&self, user_id: UserId) -> DomainResult<Vec<ChecklistEntry>> {
        let rows = self.store.list(user_id).await?;
        Ok(self.enrich(rows).await)
    }

    pub async fn get_summary(&self, user_id: UserId) -> DomainResult<ListSummary> {
        let rows = self.store.list(user_id).await?;
        Ok(ListSummary::from_rows(&rows))
    }

    pub async fn get_design_groups(&self, user_id: UserId) -> DomainResult<Vec<DesignGroup>> {
        let entries = self.get_list(user_id).await?;
        Ok(group_by_design(&entries))
    }

    async fn enrich(&self, rows: Vec<AggregateRow>) -> Vec<ChecklistEntry> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata = match self.catalog.item_metadata(row.item_id).await {
                Ok(Some(item)) => ItemMetadata::Found(item),
                Ok(None) => {
                    log::debug!("item {} missing from catalog", row.item_id);
                    ItemMetadata::placeholder(row.item_id)
                }
                Err(e) => {
                    log::warn!("catalog lookup for item {} failed: {}", row.item_id, e);
                    ItemMetadata::placeholder(row.item_id)
                }
            };
            entries.push(ChecklistEntry { row, metadata });
        }
        entries
    }
}
