//! Repository Layer - Core Traits
//!
//! Defines the abstract interface for checklist storage.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;

use super::mutation::{Mutation, MutationOutcome};
use crate::domain::{AggregateRow, DesignId, DomainResult, ItemId, UserId};

/// Durable per-user checklist rows
///
/// `apply` is the only write path. It must run the mutation against the
/// user's rows as they are inside one transaction and commit all touched rows
/// together, or nothing at all.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Apply a mutation atomically
    async fn apply(&self, user_id: UserId, mutation: Mutation, now: i64) -> DomainResult<MutationOutcome>;

    /// All rows of a user, ordered by item id
    async fn list(&self, user_id: UserId) -> DomainResult<Vec<AggregateRow>>;

    /// Find one row
    async fn find(&self, user_id: UserId, item_id: ItemId) -> DomainResult<Option<AggregateRow>>;

    /// True iff some row of the user has a contribution from the design
    async fn contains_design(&self, user_id: UserId, design_id: DesignId) -> DomainResult<bool>;
}
