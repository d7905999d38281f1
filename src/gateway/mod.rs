//! Gateway Layer
//!
//! Interfaces to the services the checklist depends on but does not own:
//! the design source, the item catalog, and session resolution.

mod traits;
mod static_gateway;

pub use traits::{DesignSource, ItemCatalog, SessionResolver};
pub use static_gateway::{StaticDesignSource, StaticItemCatalog, StaticSessions};
