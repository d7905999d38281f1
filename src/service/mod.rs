//! Service Layer
//!
//! The checklist engine and its per-user write serialization.

mod engine;
mod user_locks;


pub use engine::{ChecklistEngine, DesignAdded};
pub use user_locks::UserLocks;
