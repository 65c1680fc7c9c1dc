use super::EntitySchema;
use crate::content::EntityKind;

pub const BUILTIN_SCHEMA_VERSION: i32 = 1;

/// Version-1 schemas for every statically known entity kind.
pub fn default_schemas() -> Vec<EntitySchema> {
    EntityKind::ALL
        .into_iter()
        .map(|kind| {
            EntitySchema::from_required(kind.as_str(), BUILTIN_SCHEMA_VERSION, kind.required_fields())
        })
        .collect()
}
