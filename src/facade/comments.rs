use crate::content::{Comment, ContentShape};
use crate::core::{EntityError, EntityId, StoreResult, UserId};
use crate::model::{EntityFilters, EntityWithContent, OrderBy, OrderDirection};
use crate::store::{EntityPlacement, EntityStore};
use tracing::warn;

/// Attaches a comment to any entity and bumps the target's thread counters.
pub async fn add_comment(
    store: &EntityStore,
    target_id: EntityId,
    comment: &Comment,
    author: Option<UserId>,
) -> StoreResult<EntityWithContent<Comment>> {
    let Some(target) = store.get_entity(target_id).await? else {
        warn!(entity_id = %target_id, "comment on missing entity");
        return Err(EntityError::NotFound(target_id));
    };

    let placement = EntityPlacement::under(target.id, target.entity_type.clone()).by(author);
    let entity = store
        .create_typed(target.space_id, comment, placement)
        .await?;
    store
        .record_thread_activity(target.id, 1, entity.created_at)
        .await?;
    Ok(entity.with_content())
}

/// Live comments on an entity, oldest first.
pub async fn comments_for(
    store: &EntityStore,
    target_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<Comment>>> {
    let filters = EntityFilters::active()
        .entity_type(Comment::KIND.as_str())
        .order(OrderBy::CreatedAt, OrderDirection::Asc);
    store
        .get_entity_children_with_content(target_id, filters)
        .await
}
