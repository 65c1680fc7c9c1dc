//! Row types, write inputs and query filters for the `entities` table.

pub mod entity;
pub mod filters;
pub mod input;

pub use entity::{Entity, EntityWithContent};
pub use filters::{EntityFilters, OneOrMany, OrderBy, OrderDirection, ParentFilter};
pub use input::{CreateEntityInput, UpdateEntityInput};
