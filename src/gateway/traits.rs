//! Gateway Traits

use async_trait::async_trait;

use crate::domain::{CatalogItem, DesignId, DesignSnapshot, DomainResult, ItemId, UserId};

/// Resolves a design id to its current item list
#[async_trait]
pub trait DesignSource: Send + Sync {
    /// `Ok(None)` when the design no longer exists
    async fn design_snapshot(&self, design_id: DesignId) -> DomainResult<Option<DesignSnapshot>>;
}

/// Display metadata lookup, best-effort
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// `Ok(None)` for unknown or deleted items
    async fn item_metadata(&self, item_id: ItemId) -> DomainResult<Option<CatalogItem>>;
}

/// Maps a session token to the authenticated user
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> DomainResult<Option<UserId>>;
}
