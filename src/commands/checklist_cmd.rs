//! Checklist Commands
//!
//! Exposes checklist operations to the presentation layer.

use crate::domain::{
    AggregateRow, ChecklistEntry, DesignGroup, DesignId, DomainError, ItemId, ListSummary, UserId,
};
use crate::service::DesignAdded;
use crate::AppState;

/// Resolve the session token to a user id
async fn authenticate(state: &AppState, session: &str) -> Result<UserId, String> {
    state
        .sessions
        .resolve(session)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| DomainError::Unauthorized.to_string())
}

/// Add every item of a design to the checklist
pub async fn add_design(state: &AppState, session: &str, design_id: DesignId) -> Result<DesignAdded, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.add_design(user_id, design_id).await.map_err(|e| e.to_string())
}

/// Remove a design's contributions from the checklist
pub async fn remove_design(state: &AppState, session: &str, design_id: DesignId) -> Result<usize, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.remove_design(user_id, design_id).await.map_err(|e| e.to_string())
}

/// Add the design if it is not in the checklist, otherwise remove it
///
/// Returns whether the design is in the checklist afterwards.
pub async fn toggle_design(state: &AppState, session: &str, design_id: DesignId) -> Result<bool, String> {
    let user_id = authenticate(state, session).await?;

    let present = state
        .engine
        .is_design_in_list(user_id, design_id)
        .await
        .map_err(|e| e.to_string())?;

    if present {
        state.engine.remove_design(user_id, design_id).await.map_err(|e| e.to_string())?;
        Ok(false)
    } else {
        let added = state.engine.add_design(user_id, design_id).await.map_err(|e| e.to_string())?;
        Ok(!added.empty_design)
    }
}

/// Set how many of an item have been acquired
pub async fn set_acquired(
    state: &AppState,
    session: &str,
    item_id: ItemId,
    quantity: i64,
) -> Result<AggregateRow, String> {
    let user_id = authenticate(state, session).await?;
    state
        .engine
        .set_acquired(user_id, item_id, quantity)
        .await
        .map_err(|e| e.to_string())
}

/// Toggle an item between fully acquired and none acquired
pub async fn toggle_complete(state: &AppState, session: &str, item_id: ItemId) -> Result<AggregateRow, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.toggle_complete(user_id, item_id).await.map_err(|e| e.to_string())
}

/// Delete an item regardless of which designs contributed it
pub async fn remove_item(state: &AppState, session: &str, item_id: ItemId) -> Result<bool, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.remove_item(user_id, item_id).await.map_err(|e| e.to_string())
}

/// Delete all fully acquired items
pub async fn clear_completed(state: &AppState, session: &str) -> Result<usize, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.clear_completed(user_id).await.map_err(|e| e.to_string())
}

/// Delete every item
pub async fn clear_all(state: &AppState, session: &str) -> Result<usize, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.clear_all(user_id).await.map_err(|e| e.to_string())
}

pub async fn is_design_in_list(state: &AppState, session: &str, design_id: DesignId) -> Result<bool, String> {
    let user_id = authenticate(state, session).await?;
    state
        .engine
        .is_design_in_list(user_id, design_id)
        .await
        .map_err(|e| e.to_string())
}

/// List all items with catalog metadata
pub async fn get_list(state: &AppState, session: &str) -> Result<Vec<ChecklistEntry>, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.get_list(user_id).await.map_err(|e| e.to_string())
}

pub async fn get_summary(state: &AppState, session: &str) -> Result<ListSummary, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.get_summary(user_id).await.map_err(|e| e.to_string())
}

/// Items grouped by the design they came from
pub async fn get_design_groups(state: &AppState, session: &str) -> Result<Vec<DesignGroup>, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.get_design_groups(user_id).await.map_err(|e| e.to_string())
}

pub async fn get_item(state: &AppState, session: &str, item_id: ItemId) -> Result<Option<AggregateRow>, String> {
    let user_id = authenticate(state, session).await?;
    state.engine.get_item(user_id, item_id).await.map_err(|e| e.to_string())
}
