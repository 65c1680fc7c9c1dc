use crate::content::{ContentShape, Event};
use crate::core::{EntityError, EntityId, SpaceId, StoreResult, UserId};
use crate::model::{EntityFilters, EntityWithContent};
use crate::store::{EntityPlacement, EntityStore};
use chrono::{DateTime, Utc};

pub async fn create_event(
    store: &EntityStore,
    space_id: SpaceId,
    event: &Event,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<Event>> {
    let entity = store
        .create_typed(space_id, event, EntityPlacement::root().by(created_by))
        .await?;
    Ok(entity.with_content())
}

pub async fn update_event(
    store: &EntityStore,
    event_id: EntityId,
    event: &Event,
    edited_by: Option<UserId>,
) -> StoreResult<EntityWithContent<Event>> {
    let entity = store.update_typed(event_id, event, edited_by).await?;
    Ok(entity.with_content())
}

/// Live events of a space that overlap `[from, to)`, earliest first.
pub async fn events_between(
    store: &EntityStore,
    space_id: SpaceId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> StoreResult<Vec<EntityWithContent<Event>>> {
    if to < from {
        return Err(EntityError::InvalidValue(format!(
            "calendar window ends ({to}) before it starts ({from})"
        )));
    }

    let filters = EntityFilters::active()
        .space(space_id)
        .entity_type(Event::KIND.as_str());
    let mut events: Vec<_> = store
        .query_entities_with_content::<Event>(&filters)
        .await?
        .into_iter()
        .filter(|event| event.parsed_content.overlaps(from, to))
        .collect();
    events.sort_by_key(|event| event.parsed_content.start_time);
    Ok(events)
}
