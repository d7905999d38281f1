//! Commands Layer
//!
//! Handlers that bridge callers to the checklist engine. Each one resolves
//! the session token to a user first.

mod checklist_cmd;

pub use checklist_cmd::*;
