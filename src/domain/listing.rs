//! Read-side Views
//!
//! Catalog-enriched rows, the list summary, and the per-design grouping used
//! by the presentation layer. None of these are stored.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::aggregate::AggregateRow;
use super::entity::{DesignId, ItemId};

/// Display metadata from the item catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub name: String,
    pub icon_url: Option<String>,
    pub wow_item_id: Option<u32>,
    pub source: Option<String>,
    pub vendor: Option<String>,
    pub cost: Option<String>,
}

impl CatalogItem {
    pub fn new(item_id: ItemId, name: impl Into<String>) -> Self {
        Self {
            item_id,
            name: name.into(),
            icon_url: None,
            wow_item_id: None,
            source: None,
            vendor: None,
            cost: None,
        }
    }
}

/// Catalog lookup result for one row
///
/// A missing catalog entry never hides the row; it gets a placeholder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemMetadata {
    Found(CatalogItem),
    Placeholder { name: String },
}

impl ItemMetadata {
    pub fn placeholder(item_id: ItemId) -> Self {
        ItemMetadata::Placeholder {
            name: format!("Decor #{}", item_id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ItemMetadata::Found(item) => &item.name,
            ItemMetadata::Placeholder { name } => name,
        }
    }

    pub fn icon_url(&self) -> Option<&str> {
        match self {
            ItemMetadata::Found(item) => item.icon_url.as_deref(),
            ItemMetadata::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ItemMetadata::Placeholder { .. })
    }
}

/// A checklist row with its display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    #[serde(flatten)]
    pub row: AggregateRow,
    pub metadata: ItemMetadata,
}

/// Totals over all rows of one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub total_quantity_needed: u64,
    pub total_quantity_acquired: u64,
    pub item_count: usize,
    pub completed_count: usize,
    pub incomplete_count: usize,
    /// Distinct designs across all contributions
    pub design_count: usize,
}

impl ListSummary {
    /// Single pass over the rows
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a AggregateRow>) -> Self {
        let mut summary = ListSummary::default();
        let mut designs: HashSet<DesignId> = HashSet::new();

        for row in rows {
            summary.total_quantity_needed += u64::from(row.quantity_needed);
            summary.total_quantity_acquired += u64::from(row.quantity_acquired);
            summary.item_count += 1;
            if row.quantity_acquired < row.quantity_needed {
                summary.incomplete_count += 1;
            } else {
                summary.completed_count += 1;
            }
            designs.extend(row.contributions.iter().map(|c| c.design_id));
        }

        summary.design_count = designs.len();
        summary
    }
}

/// One row as seen from one of its source designs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignGroupEntry {
    pub item_id: ItemId,
    /// This design's contribution
    pub quantity: u32,
    /// Shared row state
    pub quantity_needed: u32,
    pub quantity_acquired: u32,
    pub is_complete: bool,
    pub metadata: ItemMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignGroup {
    pub design_id: DesignId,
    pub entries: Vec<DesignGroupEntry>,
}

impl DesignGroup {
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }
}

/// Re-key entries by each contributing design, ordered by design then item
pub fn group_by_design(entries: &[ChecklistEntry]) -> Vec<DesignGroup> {
    let mut groups: BTreeMap<DesignId, Vec<DesignGroupEntry>> = BTreeMap::new();

    for entry in entries {
        let row = &entry.row;
        for contribution in &row.contributions {
            groups.entry(contribution.design_id).or_default().push(DesignGroupEntry {
                item_id: row.item_id,
                quantity: contribution.quantity,
                quantity_needed: row.quantity_needed,
                quantity_acquired: row.quantity_acquired,
                is_complete: row.is_complete(),
                metadata: entry.metadata.clone(),
            });
        }
    }

    groups
        .into_iter()
        .map(|(design_id, mut entries)| {
            entries.sort_by_key(|e| e.item_id);
            DesignGroup { design_id, entries }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(item_id: ItemId, contributions: &[(DesignId, u32)], acquired: i64) -> AggregateRow {
        let mut row = AggregateRow::new(1, item_id, 0);
        for (design, quantity) in contributions {
            row.contribute(*design, *quantity, 0).unwrap();
        }
        row.set_acquired(acquired, 0);
        row
    }

    fn entry(row: AggregateRow) -> ChecklistEntry {
        let metadata = ItemMetadata::placeholder(row.item_id);
        ChecklistEntry { row, metadata }
    }

    #[test]
    fn test_placeholder_metadata() {
        let metadata = ItemMetadata::placeholder(42);
        assert_eq!(metadata.name(), "Decor #42");
        assert!(metadata.icon_url().is_none());
        assert!(metadata.is_placeholder());
    }

    #[test]
    fn test_summary_from_rows() {
        let rows = vec![
            row(1, &[(10, 2), (11, 3)], 5),
            row(2, &[(10, 4)], 1),
            row(3, &[(12, 1)], 0),
        ];
        let summary = ListSummary::from_rows(&rows);

        assert_eq!(summary.total_quantity_needed, 10);
        assert_eq!(summary.total_quantity_acquired, 6);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.incomplete_count, 2);
        assert_eq!(summary.design_count, 3);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(ListSummary::from_rows(std::iter::empty()), ListSummary::default());
    }

    #[test]
    fn test_group_by_design() {
        let entries = vec![
            entry(row(7, &[(11, 3), (10, 2)], 4)),
            entry(row(3, &[(10, 1)], 1)),
        ];
        let groups = group_by_design(&entries);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].design_id, 10);
        assert_eq!(
            groups[0].entries.iter().map(|e| (e.item_id, e.quantity)).collect::<Vec<_>>(),
            vec![(3, 1), (7, 2)]
        );
        assert_eq!(groups[0].total_quantity(), 3);
        assert!(groups[0].entries[0].is_complete);

        assert_eq!(groups[1].design_id, 11);
        assert_eq!(groups[1].entries[0].quantity, 3);
        assert_eq!(groups[1].entries[0].quantity_needed, 5);
        assert_eq!(groups[1].entries[0].quantity_acquired, 4);
        assert!(!groups[1].entries[0].is_complete);
    }

    #[test]
    fn test_metadata_serialization() {
        let found = ItemMetadata::Found(CatalogItem::new(5, "Lamp"));
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["kind"], "found");
        assert_eq!(json["name"], "Lamp");

        let placeholder = serde_json::to_value(ItemMetadata::placeholder(5)).unwrap();
        assert_eq!(placeholder["kind"], "placeholder");
        assert_eq!(placeholder["name"], "Decor #5");
    }
}
