//! Design Snapshot
//!
//! The item list of a design as returned by the design source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{DesignId, DomainError, DomainResult, ItemId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignItem {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl DesignItem {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// Current title and item list of a design
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSnapshot {
    pub design_id: DesignId,
    pub title: String,
    pub items: Vec<DesignItem>,
}

impl DesignSnapshot {
    pub fn new(design_id: DesignId, title: impl Into<String>, items: Vec<DesignItem>) -> Self {
        Self {
            design_id,
            title: title.into(),
            items,
        }
    }

    /// Items with duplicates merged and zero quantities dropped, by item id
    pub fn normalized_items(&self) -> DomainResult<BTreeMap<ItemId, u32>> {
        let mut merged: BTreeMap<ItemId, u32> = BTreeMap::new();
        for item in self.items.iter().filter(|i| i.quantity > 0) {
            let slot = merged.entry(item.item_id).or_insert(0);
            *slot = slot.checked_add(item.quantity).ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "design {} lists more than {} of item {}",
                    self.design_id,
                    u32::MAX,
                    item.item_id
                ))
            })?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_items_merges_duplicates() {
        let snapshot = DesignSnapshot::new(
            1,
            "Tavern",
            vec![DesignItem::new(5, 2), DesignItem::new(3, 1), DesignItem::new(5, 4)],
        );
        let items = snapshot.normalized_items().unwrap();
        assert_eq!(items.into_iter().collect::<Vec<_>>(), vec![(3, 1), (5, 6)]);
    }

    #[test]
    fn test_normalized_items_drops_zero() {
        let snapshot = DesignSnapshot::new(1, "Empty-ish", vec![DesignItem::new(5, 0)]);
        assert!(snapshot.normalized_items().unwrap().is_empty());
    }

    #[test]
    fn test_normalized_items_overflow() {
        let snapshot = DesignSnapshot::new(
            1,
            "Huge",
            vec![DesignItem::new(5, u32::MAX), DesignItem::new(5, 1)],
        );
        assert!(matches!(snapshot.normalized_items(), Err(DomainError::InvalidInput(_))));
    }
}
