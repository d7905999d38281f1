//! In-process Gateways
//!
//! Map-backed implementations for embedding the engine without the external
//! services, and for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::{DesignSource, ItemCatalog, SessionResolver};
use crate::domain::{CatalogItem, DesignId, DesignSnapshot, DomainResult, ItemId, UserId};

#[derive(Default)]
pub struct StaticDesignSource {
    designs: RwLock<HashMap<DesignId, DesignSnapshot>>,
}

impl StaticDesignSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a design
    pub async fn insert(&self, snapshot: DesignSnapshot) {
        self.designs.write().await.insert(snapshot.design_id, snapshot);
    }

    pub async fn remove(&self, design_id: DesignId) -> Option<DesignSnapshot> {
        self.designs.write().await.remove(&design_id)
    }
}

#[async_trait]
impl DesignSource for StaticDesignSource {
    async fn design_snapshot(&self, design_id: DesignId) -> DomainResult<Option<DesignSnapshot>> {
        Ok(self.designs.read().await.get(&design_id).cloned())
    }
}

#[derive(Default)]
pub struct StaticItemCatalog {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
}

impl StaticItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, item: CatalogItem) {
        self.items.write().await.insert(item.item_id, item);
    }

    pub async fn remove(&self, item_id: ItemId) -> Option<CatalogItem> {
        self.items.write().await.remove(&item_id)
    }
}

#[async_trait]
impl ItemCatalog for StaticItemCatalog {
    async fn item_metadata(&self, item_id: ItemId) -> DomainResult<Option<CatalogItem>> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }
}

#[derive(Default)]
pub struct StaticSessions {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: &str, user_id: UserId) {
        self.tokens.write().await.insert(token.to_string(), user_id);
    }

    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

#[async_trait]
impl SessionResolver for StaticSessions {
    async fn resolve(&self, token: &str) -> DomainResult<Option<UserId>> {
        Ok(self.tokens.read().await.get(token).copied())
    }
}
