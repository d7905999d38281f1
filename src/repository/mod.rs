//! Repository Layer
//!
//! Data access abstractions and implementations.
//! - traits: the AggregateStore contract
//! - mutation: checklist mutations applied inside a store transaction
//! - checklist_repo: SQLite store
//! - memory_repo: in-memory store

mod traits;
mod db;
mod mutation;
mod checklist_repo;
mod memory_repo;


pub use traits::AggregateStore;
pub use db::{init_db, DbState};
pub use mutation::{Checklist, Mutation, MutationOutcome};
pub use checklist_repo::ChecklistRepository;
pub use memory_repo::MemoryChecklistRepository;
