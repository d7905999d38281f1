//! Checklist Mutations
//!
//! Every write to a user's checklist is expressed as a `Mutation` and applied
//! to the user's rows as loaded inside the store's transaction. The store then
//! persists exactly the rows the mutation touched. Quantities are always
//! rebuilt from the contributions present at that moment, never patched with
//! a delta computed earlier.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::domain::{AggregateRow, DesignId, DomainError, DomainResult, Entity, ItemId, UserId};

/// A single atomic change to one user's checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Make the design's contributions match `items` (normalized snapshot)
    AddDesign {
        design_id: DesignId,
        items: BTreeMap<ItemId, u32>,
    },
    RemoveDesign { design_id: DesignId },
    SetAcquired { item_id: ItemId, quantity: i64 },
    ToggleComplete { item_id: ItemId },
    RemoveItem { item_id: ItemId },
    ClearCompleted,
    ClearAll,
}

impl Mutation {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddDesign { .. } => "add_design",
            Mutation::RemoveDesign { .. } => "remove_design",
            Mutation::SetAcquired { .. } => "set_acquired",
            Mutation::ToggleComplete { .. } => "toggle_complete",
            Mutation::RemoveItem { .. } => "remove_item",
            Mutation::ClearCompleted => "clear_completed",
            Mutation::ClearAll => "clear_all",
        }
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Rows created, updated or deleted
    pub affected: usize,
    /// The row after single-row edits (`SetAcquired`, `ToggleComplete`)
    pub row: Option<AggregateRow>,
}

/// One user's rows plus the set of rows a mutation touched
#[derive(Debug, Clone)]
pub struct Checklist {
    user_id: UserId,
    rows: BTreeMap<ItemId, AggregateRow>,
    changed: BTreeSet<ItemId>,
    removed: BTreeSet<ItemId>,
}

impl Checklist {
    pub fn new(user_id: UserId, rows: impl IntoIterator<Item = AggregateRow>) -> Self {
        Self {
            user_id,
            rows: rows.into_iter().map(|row| (row.item_id, row)).collect(),
            changed: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn rows(&self) -> impl Iterator<Item = &AggregateRow> {
        self.rows.values()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that must be written back
    pub fn changed_rows(&self) -> impl Iterator<Item = &AggregateRow> {
        self.changed.iter().filter_map(|id| self.rows.get(id))
    }

    /// Rows that must be deleted
    pub fn removed_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.removed.iter().copied()
    }

    pub fn into_rows(self) -> BTreeMap<ItemId, AggregateRow> {
        self.rows
    }

    fn mark_changed(&mut self, item_id: ItemId) {
        self.removed.remove(&item_id);
        self.changed.insert(item_id);
    }

    fn remove(&mut self, item_id: ItemId) -> bool {
        if self.rows.remove(&item_id).is_none() {
            return false;
        }
        self.changed.remove(&item_id);
        self.removed.insert(item_id);
        true
    }

    fn row_mut(&mut self, item_id: ItemId) -> DomainResult<&mut AggregateRow> {
        self.rows.get_mut(&item_id).ok_or(DomainError::ItemNotFound(item_id))
    }

    /// Apply `mutation` in memory
    ///
    /// On error the checklist is left partially modified and must be thrown
    /// away together with the surrounding transaction.
    pub fn apply(&mut self, mutation: &Mutation, now: i64) -> DomainResult<MutationOutcome> {
        match mutation {
            Mutation::AddDesign { design_id, items } => self.add_design(*design_id, items, now),
            Mutation::RemoveDesign { design_id } => self.remove_design(*design_id, now),
            Mutation::SetAcquired { item_id, quantity } => {
                let row = self.row_mut(*item_id)?;
                let changed = row.set_acquired(*quantity, now);
                let row = row.clone();
                if changed {
                    self.mark_changed(*item_id);
                }
                Ok(MutationOutcome {
                    affected: usize::from(changed),
                    row: Some(row),
                })
            }
            Mutation::ToggleComplete { item_id } => {
                let row = self.row_mut(*item_id)?;
                row.toggle_complete(now);
                let row = row.clone();
                self.mark_changed(*item_id);
                Ok(MutationOutcome {
                    affected: 1,
                    row: Some(row),
                })
            }
            Mutation::RemoveItem { item_id } => Ok(MutationOutcome {
                affected: usize::from(self.remove(*item_id)),
                row: None,
            }),
            Mutation::ClearCompleted => {
                let done: Vec<ItemId> = self
                    .rows
                    .values()
                    .filter(|row| row.is_complete())
                    .map(|row| row.item_id)
                    .collect();
                Ok(self.remove_all(done))
            }
            Mutation::ClearAll => {
                let all: Vec<ItemId> = self.rows.keys().copied().collect();
                Ok(self.remove_all(all))
            }
        }
    }

    fn remove_all(&mut self, item_ids: Vec<ItemId>) -> MutationOutcome {
        let affected = item_ids.into_iter().filter(|id| self.remove(*id)).count();
        MutationOutcome { affected, row: None }
    }

    fn add_design(
        &mut self,
        design_id: DesignId,
        items: &BTreeMap<ItemId, u32>,
        now: i64,
    ) -> DomainResult<MutationOutcome> {
        // Items this design no longer lists lose its contribution
        let stale: Vec<ItemId> = self
            .rows
            .values()
            .filter(|row| row.has_design(design_id) && !items.contains_key(&row.item_id))
            .map(|row| row.item_id)
            .collect();
        let mut affected = 0;
        for item_id in stale {
            if self.withdraw(item_id, design_id, now)? {
                affected += 1;
            }
        }

        for (&item_id, &quantity) in items {
            let user_id = self.user_id;
            let row = self
                .rows
                .entry(item_id)
                .or_insert_with(|| AggregateRow::new(user_id, item_id, now));
            if row.contribute(design_id, quantity, now)? {
                self.mark_changed(item_id);
                affected += 1;
            }
        }

        Ok(MutationOutcome { affected, row: None })
    }

    fn remove_design(&mut self, design_id: DesignId, now: i64) -> DomainResult<MutationOutcome> {
        let holding: Vec<ItemId> = self
            .rows
            .values()
            .filter(|row| row.has_design(design_id))
            .map(|row| row.item_id)
            .collect();

        let mut affected = 0;
        for item_id in holding {
            if self.withdraw(item_id, design_id, now)? {
                affected += 1;
            }
        }
        Ok(MutationOutcome { affected, row: None })
    }

    /// Withdraw one design from one row, deleting the row once it is empty
    fn withdraw(&mut self, item_id: ItemId, design_id: DesignId, now: i64) -> DomainResult<bool> {
        let row = self.row_mut(item_id)?;
        if !row.withdraw(design_id, now)? {
            return Ok(false);
        }
        if row.is_empty() {
            self.remove(item_id);
        } else {
            self.mark_changed(item_id);
        }
        Ok(true)
    }

    /// Check every row invariant plus row uniqueness and ownership
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (item_id, row) in &self.rows {
            if row.item_id != *item_id || row.user_id != self.user_id {
                return Err(format!("row {:?} filed under ({}, {})", row.id(), self.user_id, item_id));
            }
            if !seen.insert(row.id()) {
                return Err(format!("duplicate row {:?}", row.id()));
            }
            row.check_invariants()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(ItemId, u32)]) -> BTreeMap<ItemId, u32> {
        pairs.iter().copied().collect()
    }

    fn add(design_id: DesignId, pairs: &[(ItemId, u32)]) -> Mutation {
        Mutation::AddDesign {
            design_id,
            items: items(pairs),
        }
    }

    #[test]
    fn test_add_design_creates_rows() {
        let mut checklist = Checklist::new(1, Vec::new());
        let outcome = checklist.apply(&add(10, &[(42, 2), (43, 1)]), 100).unwrap();

        assert_eq!(outcome.affected, 2);
        assert_eq!(checklist.changed_rows().count(), 2);
        assert_eq!(checklist.removed_items().count(), 0);
        assert!(checklist.check_invariants().is_ok());
    }

    #[test]
    fn test_add_design_twice_is_noop() {
        let mut checklist = Checklist::new(1, Vec::new());
        checklist.apply(&add(10, &[(42, 2)]), 100).unwrap();
        let rows = checklist.clone().into_rows();

        let mut again = Checklist::new(1, rows.into_values());
        let outcome = again.apply(&add(10, &[(42, 2)]), 200).unwrap();
        assert_eq!(outcome.affected, 0);
        assert_eq!(again.changed_rows().count(), 0);
    }

    #[test]
    fn test_add_design_withdraws_dropped_items() {
        let mut checklist = Checklist::new(1, Vec::new());
        checklist.apply(&add(10, &[(42, 2), (43, 1)]), 100).unwrap();
        checklist.apply(&add(11, &[(43, 4)]), 100).unwrap();

        let mut edited = Checklist::new(1, checklist.into_rows().into_values());
        let outcome = edited.apply(&add(10, &[(42, 3)]), 200).unwrap();

        assert_eq!(outcome.affected, 2);
        let rows = edited.clone().into_rows();
        assert_eq!(rows[&42].quantity_needed, 3);
        assert_eq!(rows[&43].quantity_needed, 4);
        assert!(!rows[&43].has_design(10));
    }

    #[test]
    fn test_remove_design_deletes_empty_rows() {
        let mut checklist = Checklist::new(1, Vec::new());
        checklist.apply(&add(10, &[(42, 2), (43, 1)]), 100).unwrap();
        checklist.apply(&add(11, &[(42, 3)]), 100).unwrap();

        let mut next = Checklist::new(1, checklist.into_rows().into_values());
        let outcome = next.apply(&Mutation::RemoveDesign { design_id: 10 }, 200).unwrap();

        assert_eq!(outcome.affected, 2);
        assert_eq!(next.removed_items().collect::<Vec<_>>(), vec![43]);
        assert_eq!(next.changed_rows().map(|r| r.item_id).collect::<Vec<_>>(), vec![42]);
        assert!(next.check_invariants().is_ok());
    }

    #[test]
    fn test_missing_item_errors() {
        let mut checklist = Checklist::new(1, Vec::new());
        let err = checklist
            .apply(&Mutation::ToggleComplete { item_id: 9 }, 100)
            .unwrap_err();
        assert_eq!(err, DomainError::ItemNotFound(9));

        let outcome = checklist.apply(&Mutation::RemoveItem { item_id: 9 }, 100).unwrap();
        assert_eq!(outcome.affected, 0);
    }

    #[test]
    fn test_clear_completed_keeps_open_rows() {
        let mut checklist = Checklist::new(1, Vec::new());
        checklist.apply(&add(10, &[(42, 2), (43, 1), (44, 5)]), 100).unwrap();
        checklist
            .apply(&Mutation::SetAcquired { item_id: 43, quantity: 1 }, 100)
            .unwrap();
        checklist
            .apply(&Mutation::SetAcquired { item_id: 44, quantity: 2 }, 100)
            .unwrap();

        let outcome = checklist.apply(&Mutation::ClearCompleted, 200).unwrap();
        assert_eq!(outcome.affected, 1);
        assert_eq!(checklist.rows().map(|r| r.item_id).collect::<Vec<_>>(), vec![42, 44]);
    }

    #[test]
    fn test_removed_then_recreated_row_is_written() {
        let mut checklist = Checklist::new(1, Vec::new());
        checklist.apply(&add(10, &[(42, 2)]), 100).unwrap();
        checklist.apply(&Mutation::ClearAll, 100).unwrap();
        checklist.apply(&add(10, &[(42, 2)]), 100).unwrap();

        assert_eq!(checklist.removed_items().count(), 0);
        assert_eq!(checklist.changed_rows().count(), 1);
    }
}
