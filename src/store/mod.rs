//! The entity store: CRUD and queries over the single polymorphic `entities` table.

pub mod entity_store;
pub mod placement;

pub use entity_store::EntityStore;
pub use placement::EntityPlacement;
