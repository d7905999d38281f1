//! Checklist Repository Implementation
//!
//! SQLite-backed implementation of AggregateStore.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::mutation::{Checklist, Mutation, MutationOutcome};
use super::traits::AggregateStore;
use crate::domain::{AggregateRow, Contribution, DesignId, DomainError, DomainResult, ItemId, UserId};

/// SQLite implementation of the checklist store
pub struct ChecklistRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl ChecklistRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }
}

fn storage(e: rusqlite::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn not_initialized() -> DomainError {
    DomainError::Storage("Database not initialized".to_string())
}

#[async_trait]
impl AggregateStore for ChecklistRepository {
    async fn apply(&self, user_id: UserId, mutation: Mutation, now: i64) -> DomainResult<MutationOutcome> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        // IMMEDIATE takes the write lock before the rows are read
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage)?;

        let rows = load_rows(&tx, user_id)?;
        let mut checklist = Checklist::new(user_id, rows);
        // Dropping `tx` on error rolls back
        let outcome = checklist.apply(&mutation, now)?;
        persist(&tx, &checklist)?;
        tx.commit().map_err(storage)?;

        Ok(outcome)
    }

    async fn list(&self, user_id: UserId) -> DomainResult<Vec<AggregateRow>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_rows(conn, user_id)
    }

    async fn find(&self, user_id: UserId, item_id: ItemId) -> DomainResult<Option<AggregateRow>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let row = conn
            .query_row(
                "SELECT item_id, quantity_needed, quantity_acquired, created_at, updated_at
                 FROM checklist_items WHERE user_id = ?1 AND item_id = ?2",
                params![user_id, item_id],
                |row| row_to_aggregate(user_id, row),
            )
            .optional()
            .map_err(storage)?;

        let Some(mut row) = row else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare_cached(
                "SELECT design_id, quantity, added_at FROM checklist_contributions
                 WHERE user_id = ?1 AND item_id = ?2 ORDER BY ordinal",
            )
            .map_err(storage)?;
        let contributions = stmt
            .query_map(params![user_id, item_id], |r| {
                Ok(Contribution {
                    design_id: r.get(0)?,
                    quantity: r.get(1)?,
                    added_at: r.get(2)?,
                })
            })
            .map_err(storage)?;
        for contribution in contributions {
            row.contributions.push(contribution.map_err(storage)?);
        }

        Ok(Some(row))
    }

    async fn contains_design(&self, user_id: UserId, design_id: DesignId) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM checklist_contributions WHERE user_id = ?1 AND design_id = ?2)",
            params![user_id, design_id],
            |row| row.get::<_, bool>(0),
        )
        .map_err(storage)
    }
}

/// Load every row of a user together with its contributions, by item id
fn load_rows(conn: &Connection, user_id: UserId) -> DomainResult<Vec<AggregateRow>> {
    let mut rows: BTreeMap<ItemId, AggregateRow> = BTreeMap::new();

    let mut stmt = conn
        .prepare_cached(
            "SELECT item_id, quantity_needed, quantity_acquired, created_at, updated_at
             FROM checklist_items WHERE user_id = ?1 ORDER BY item_id",
        )
        .map_err(storage)?;
    let mapped = stmt
        .query_map(params![user_id], |row| row_to_aggregate(user_id, row))
        .map_err(storage)?;
    for row in mapped {
        let row = row.map_err(storage)?;
        rows.insert(row.item_id, row);
    }

    let mut stmt = conn
        .prepare_cached(
            "SELECT item_id, design_id, quantity, added_at FROM checklist_contributions
             WHERE user_id = ?1 ORDER BY item_id, ordinal",
        )
        .map_err(storage)?;
    let mapped = stmt
        .query_map(params![user_id], |r| {
            Ok((
                r.get::<_, ItemId>(0)?,
                Contribution {
                    design_id: r.get(1)?,
                    quantity: r.get(2)?,
                    added_at: r.get(3)?,
                },
            ))
        })
        .map_err(storage)?;
    for entry in mapped {
        let (item_id, contribution) = entry.map_err(storage)?;
        match rows.get_mut(&item_id) {
            Some(row) => row.contributions.push(contribution),
            None => {
                return Err(DomainError::Storage(format!(
                    "contribution for missing row ({}, {})",
                    user_id, item_id
                )))
            }
        }
    }

    Ok(rows.into_values().collect())
}

/// Write back the rows a mutation touched
fn persist(conn: &Connection, checklist: &Checklist) -> DomainResult<()> {
    let user_id = checklist.user_id();

    for item_id in checklist.removed_items() {
        conn.execute(
            "DELETE FROM checklist_contributions WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
        )
        .map_err(storage)?;
        conn.execute(
            "DELETE FROM checklist_items WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
        )
        .map_err(storage)?;
    }

    for row in checklist.changed_rows() {
        conn.execute(
            "INSERT INTO checklist_items
                (user_id, item_id, quantity_needed, quantity_acquired, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, item_id) DO UPDATE SET
                quantity_needed = excluded.quantity_needed,
                quantity_acquired = excluded.quantity_acquired,
                updated_at = excluded.updated_at",
            params![
                user_id,
                row.item_id,
                row.quantity_needed,
                row.quantity_acquired,
                row.created_at,
                row.updated_at
            ],
        )
        .map_err(storage)?;

        conn.execute(
            "DELETE FROM checklist_contributions WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, row.item_id],
        )
        .map_err(storage)?;

        let mut insert = conn
            .prepare_cached(
                "INSERT INTO checklist_contributions
                    (user_id, item_id, design_id, quantity, added_at, ordinal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(storage)?;
        for (ordinal, c) in row.contributions.iter().enumerate() {
            insert
                .execute(params![user_id, row.item_id, c.design_id, c.quantity, c.added_at, ordinal as i64])
                .map_err(storage)?;
        }
    }

    Ok(())
}

/// Convert a database row to AggregateRow (contributions filled in separately)
fn row_to_aggregate(user_id: UserId, row: &rusqlite::Row) -> rusqlite::Result<AggregateRow> {
    Ok(AggregateRow {
        user_id,
        item_id: row.get(0)?,
        quantity_needed: row.get(1)?,
        quantity_acquired: row.get(2)?,
        contributions: Vec::new(),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
