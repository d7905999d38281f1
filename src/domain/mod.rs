//! Domain Layer
//!
//! Contains the checklist entities and the provenance bookkeeping rules.
//! This layer has NO external dependencies (except serde for serialization).

mod entity;
mod aggregate;
mod design;
mod listing;

pub use entity::{Entity, DomainError, DomainResult, UserId, ItemId, DesignId};
pub use aggregate::{AggregateRow, Contribution};
pub use design::{DesignItem, DesignSnapshot};
pub use listing::{
    group_by_design, CatalogItem, ChecklistEntry, DesignGroup, DesignGroupEntry, ItemMetadata,
    ListSummary,
};
