//! Feature façades: free functions that encode each feature's parenting rules on top
//! of [`EntityStore`].

pub mod comments;
pub mod events;
pub mod files;
pub mod projects;
pub mod votes;

use crate::content::ContentShape;
use crate::core::{EntityError, EntityId, StoreResult};
use crate::model::EntityWithContent;
use crate::store::EntityStore;
use tracing::warn;

/// Loads an entity that must exist and must be of kind `C`.
pub(crate) async fn require_typed<C: ContentShape>(
    store: &EntityStore,
    id: EntityId,
) -> StoreResult<EntityWithContent<C>> {
    let Some(entity) = store.get_entity(id).await? else {
        warn!(entity_id = %id, expected = C::KIND.as_str(), "entity not found");
        return Err(EntityError::NotFound(id));
    };
    if entity.entity_type != C::KIND.as_str() {
        warn!(entity_id = %id, stored = %entity.entity_type, expected = C::KIND.as_str(), "unexpected entity type");
        return Err(EntityError::invalid_content(format!(
            "entity {id} is a {}, not a {}",
            entity.entity_type,
            C::KIND
        )));
    }
    Ok(entity.with_content())
}
