//! Aggregate Row Entity
//!
//! One checklist row per (user, item), merging the quantities every added
//! design asks for. Each design's share is kept as a `Contribution` so it can
//! be withdrawn again later.

use serde::{Deserialize, Serialize};

use super::entity::{DesignId, DomainError, DomainResult, Entity, ItemId, UserId};

/// Quantity of one item attributed to one source design
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub design_id: DesignId,
    /// Always > 0
    pub quantity: u32,
    pub added_at: i64,
}

/// Merged per-user, per-item checklist record
///
/// `quantity_needed` is the sum of the contribution quantities and
/// `quantity_acquired` never exceeds it. All mutators keep both true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity_needed: u32,
    pub quantity_acquired: u32,
    pub contributions: Vec<Contribution>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AggregateRow {
    /// Create a row with no contributions yet
    ///
    /// Only valid until the first `contribute`; an empty row is never stored.
    pub fn new(user_id: UserId, item_id: ItemId, now: i64) -> Self {
        Self {
            user_id,
            item_id,
            quantity_needed: 0,
            quantity_acquired: 0,
            contributions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contribution(&self, design_id: DesignId) -> Option<&Contribution> {
        self.contributions.iter().find(|c| c.design_id == design_id)
    }

    pub fn has_design(&self, design_id: DesignId) -> bool {
        self.contribution(design_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Fully acquired
    pub fn is_complete(&self) -> bool {
        self.quantity_acquired == self.quantity_needed
    }

    pub fn remaining(&self) -> u32 {
        self.quantity_needed - self.quantity_acquired
    }

    /// Set this design's share of the row to `quantity`
    ///
    /// Replaces an existing contribution from the same design instead of
    /// adding to it. Returns whether the row changed.
    pub fn contribute(&mut self, design_id: DesignId, quantity: u32, now: i64) -> DomainResult<bool> {
        if quantity == 0 {
            return Err(DomainError::InvalidInput(format!(
                "design {} contributes zero of item {}",
                design_id, self.item_id
            )));
        }
        if self.contribution(design_id).map(|c| c.quantity) == Some(quantity) {
            return Ok(false);
        }

        let others = self
            .contributions
            .iter()
            .filter(|c| c.design_id != design_id)
            .try_fold(0u32, |acc, c| acc.checked_add(c.quantity));
        if others.and_then(|sum| sum.checked_add(quantity)).is_none() {
            return Err(self.overflow());
        }

        match self.contributions.iter_mut().find(|c| c.design_id == design_id) {
            Some(existing) => existing.quantity = quantity,
            None => self.contributions.push(Contribution {
                design_id,
                quantity,
                added_at: now,
            }),
        }
        self.recompute()?;
        self.updated_at = now;
        Ok(true)
    }

    /// Drop this design's contribution, if any. Returns whether the row changed.
    pub fn withdraw(&mut self, design_id: DesignId, now: i64) -> DomainResult<bool> {
        let before = self.contributions.len();
        self.contributions.retain(|c| c.design_id != design_id);
        if self.contributions.len() == before {
            return Ok(false);
        }
        self.recompute()?;
        self.updated_at = now;
        Ok(true)
    }

    /// Set the acquired count, clamped into `[0, quantity_needed]`
    pub fn set_acquired(&mut self, quantity: i64, now: i64) -> bool {
        let clamped = quantity.clamp(0, i64::from(self.quantity_needed)) as u32;
        if clamped == self.quantity_acquired {
            return false;
        }
        self.quantity_acquired = clamped;
        self.updated_at = now;
        true
    }

    /// Fully acquired goes back to 0, anything else becomes fully acquired
    pub fn toggle_complete(&mut self, now: i64) {
        self.quantity_acquired = if self.is_complete() { 0 } else { self.quantity_needed };
        self.updated_at = now;
    }

    /// Rebuild `quantity_needed` from the contributions and clamp the
    /// acquired count down to it.
    fn recompute(&mut self) -> DomainResult<()> {
        let total = self
            .contributions
            .iter()
            .try_fold(0u32, |acc, c| acc.checked_add(c.quantity))
            .ok_or_else(|| self.overflow())?;
        self.quantity_needed = total;
        self.quantity_acquired = self.quantity_acquired.min(total);
        Ok(())
    }

    fn overflow(&self) -> DomainError {
        DomainError::InvalidInput(format!("quantity of item {} overflows", self.item_id))
    }

    /// Check the row-level invariants, describing the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.contributions.is_empty() {
            return Err(format!("item {} has no contributions", self.item_id));
        }
        let mut sum: u64 = 0;
        for (i, c) in self.contributions.iter().enumerate() {
            if c.quantity == 0 {
                return Err(format!("item {} has a zero contribution from design {}", self.item_id, c.design_id));
            }
            if self.contributions[..i].iter().any(|o| o.design_id == c.design_id) {
                return Err(format!("item {} lists design {} twice", self.item_id, c.design_id));
            }
            sum += u64::from(c.quantity);
        }
        if sum != u64::from(self.quantity_needed) {
            return Err(format!(
                "item {} needs {} but contributions sum to {}",
                self.item_id, self.quantity_needed, sum
            ));
        }
        if self.quantity_acquired > self.quantity_needed {
            return Err(format!(
                "item {} acquired {} of {}",
                self.item_id, self.quantity_acquired, self.quantity_needed
            ));
        }
        Ok(())
    }
}

impl Entity for AggregateRow {
    type Id = (UserId, ItemId);

    fn id(&self) -> Self::Id {
        (self.user_id, self.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(contributions: &[(DesignId, u32)]) -> AggregateRow {
        let mut row = AggregateRow::new(1, 42, 0);
        for (design, quantity) in contributions {
            row.contribute(*design, *quantity, 0).unwrap();
        }
        row
    }

    #[test]
    fn test_contribute_sums_designs() {
        let row = row_with(&[(10, 2), (11, 3)]);
        assert_eq!(row.quantity_needed, 5);
        assert_eq!(row.contributions.len(), 2);
        assert!(row.check_invariants().is_ok());
    }

    #[test]
    fn test_contribute_replaces_same_design() {
        let mut row = row_with(&[(10, 2)]);
        assert!(row.contribute(10, 4, 5).unwrap());
        assert_eq!(row.quantity_needed, 4);
        assert_eq!(row.contributions.len(), 1);
        assert_eq!(row.updated_at, 5);

        assert!(!row.contribute(10, 4, 6).unwrap());
        assert_eq!(row.updated_at, 5);
    }

    #[test]
    fn test_contribute_rejects_zero() {
        let mut row = row_with(&[(10, 2)]);
        assert!(matches!(row.contribute(11, 0, 1), Err(DomainError::InvalidInput(_))));
        assert_eq!(row.quantity_needed, 2);
    }

    #[test]
    fn test_contribute_overflow_leaves_row_untouched() {
        let mut row = row_with(&[(10, u32::MAX - 1)]);
        let before = row.clone();
        assert!(row.contribute(11, 2, 1).is_err());
        assert_eq!(row, before);
    }

    #[test]
    fn test_withdraw_clamps_acquired() {
        let mut row = row_with(&[(10, 3), (11, 2)]);
        row.set_acquired(5, 1);
        assert!(row.withdraw(11, 2).unwrap());
        assert_eq!(row.quantity_needed, 3);
        assert_eq!(row.quantity_acquired, 3);

        assert!(!row.withdraw(11, 3).unwrap());
        assert!(row.withdraw(10, 4).unwrap());
        assert!(row.is_empty());
        assert_eq!(row.quantity_acquired, 0);
    }

    #[test]
    fn test_set_acquired_clamps() {
        let mut row = row_with(&[(10, 4)]);
        row.set_acquired(9, 1);
        assert_eq!(row.quantity_acquired, 4);
        row.set_acquired(-3, 2);
        assert_eq!(row.quantity_acquired, 0);
        assert!(!row.set_acquired(0, 3));
    }

    #[test]
    fn test_toggle_complete() {
        let mut row = row_with(&[(10, 4)]);
        row.set_acquired(1, 1);
        row.toggle_complete(2);
        assert_eq!(row.quantity_acquired, 4);
        row.toggle_complete(3);
        assert_eq!(row.quantity_acquired, 0);
    }

    #[test]
    fn test_check_invariants_detects_drift() {
        let mut row = row_with(&[(10, 4)]);
        row.quantity_needed = 7;
        assert!(row.check_invariants().is_err());

        let mut row = row_with(&[(10, 4)]);
        row.quantity_acquired = 5;
        assert!(row.check_invariants().is_err());

        assert!(AggregateRow::new(1, 2, 0).check_invariants().is_err());
    }

    #[test]
    fn test_row_id() {
        let row = row_with(&[(10, 1)]);
        assert_eq!(row.id(), (1, 42));
    }
}
