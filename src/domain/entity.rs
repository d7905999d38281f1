//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use serde::{Deserialize, Serialize};

/// User identifier as resolved by the authentication service
pub type UserId = u32;
/// Catalog item identifier
pub type ItemId = u32;
/// Design identifier
pub type DesignId = u32;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    /// The design id no longer resolves
    DesignNotFound(DesignId),
    /// No checklist row exists for the item
    ItemNotFound(ItemId),
    InvalidInput(String),
    Unauthorized,
    /// The design source could not be reached
    Gateway(String),
    /// Store failure, message passed through verbatim
    Storage(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::DesignNotFound(id) => write!(f, "Design {} not found", id),
            DomainError::ItemNotFound(id) => write!(f, "Item {} is not in the checklist", id),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Unauthorized => write!(f, "Unauthorized"),
            DomainError::Gateway(msg) => write!(f, "Design source error: {}", msg),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(DomainError::DesignNotFound(7).to_string(), "Design 7 not found");
        assert_eq!(
            DomainError::ItemNotFound(42).to_string(),
            "Item 42 is not in the checklist"
        );
        assert_eq!(
            DomainError::Storage("disk I/O error".into()).to_string(),
            "Storage error: disk I/O error"
        );
    }
}
