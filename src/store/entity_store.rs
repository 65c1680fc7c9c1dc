use super::EntityPlacement;
use crate::content::ContentShape;
use crate::core::{
    EncryptionType, EntityError, EntityId, EntityStatus, SpaceId, StoreResult, UserId,
};
use crate::model::{CreateEntityInput, Entity, EntityFilters, EntityWithContent, UpdateEntityInput};
use crate::schema::SchemaRegistry;
use crate::storage::{Datastore, EntityChanges, Stamp};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The only component that reads or writes entity rows.
///
/// Cloning is cheap; clones share the same datastore.
#[derive(Clone)]
pub struct EntityStore {
    datastore: Arc<dyn Datastore>,
    schemas: SchemaRegistry,
    default_limit: Option<usize>,
}

impl EntityStore {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self {
            schemas: SchemaRegistry::new(datastore.clone()),
            datastore,
            default_limit: None,
        }
    }

    /// Page size used by [`EntityStore::query_page`] when the filters set no limit.
    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn datastore(&self) -> &Arc<dyn Datastore> {
        &self.datastore
    }

    pub async fn create_entity(&self, input: CreateEntityInput) -> StoreResult<Entity> {
        match &input.content {
            Some(content) => self.schemas.validate(&input.entity_type, content).await?,
            None => self.require_schema(&input.entity_type).await?,
        }

        let parent_type = match (input.parent_id, input.parent_type) {
            (Some(parent_id), None) => self.parent_type_of(parent_id).await?,
            (_, parent_type) => parent_type,
        };

        let content = input
            .content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let now = Utc::now();
        let entity = Entity {
            id: EntityId::new_v4(),
            space_id: input.space_id,
            entity_type: input.entity_type,
            parent_id: input.parent_id,
            parent_type,
            title: input.title,
            summary: input.summary,
            content,
            metadata: input.metadata.unwrap_or_default(),
            status: input.status.unwrap_or(EntityStatus::Approved),
            encryption_type: input.encryption_type.unwrap_or(EncryptionType::None),
            is_edited: false,
            edited_at: None,
            edited_by: None,
            deleted_by: None,
            deleted_at: None,
            thread_count: 0,
            last_activity_at: None,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .datastore
            .insert_entity(entity)
            .await
            .inspect_err(|err| error!(error = %err, "failed to insert entity"))?;
        info!(
            entity_id = %created.id,
            entity_type = %created.entity_type,
            space_id = %created.space_id,
            "entity created"
        );
        Ok(created)
    }

    /// Creates an entity from a statically known content shape.
    ///
    /// The shape's own validator runs first, then the registry check. Title and summary
    /// are derived from the content.
    pub async fn create_typed<C: ContentShape>(
        &self,
        space_id: SpaceId,
        content: &C,
        placement: EntityPlacement,
    ) -> StoreResult<Entity> {
        content
            .validate()
            .inspect_err(|err| warn!(entity_type = C::KIND.as_str(), error = %err, "typed content rejected"))?;

        let mut input = CreateEntityInput::new(space_id, C::KIND.as_str())
            .content(serde_json::to_value(content)?);
        input.title = content.display_title();
        input.summary = content.display_summary();

        self.create_entity(placement.apply(input)).await
    }

    pub async fn get_entity(&self, id: EntityId) -> StoreResult<Option<Entity>> {
        self.datastore
            .fetch_entity(id)
            .await
            .inspect_err(|err| error!(entity_id = %id, error = %err, "failed to fetch entity"))
    }

    /// Fetches an entity and parses its content. Unreadable content yields an empty value.
    pub async fn get_entity_with_content<T>(&self, id: EntityId) -> StoreResult<Option<EntityWithContent<T>>>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.get_entity(id).await?.map(Entity::with_content))
    }

    /// Every matching row, limited only by the filters themselves.
    pub async fn query_entities(&self, filters: &EntityFilters) -> StoreResult<Vec<Entity>> {
        let rows = self
            .datastore
            .query_entities(filters)
            .await
            .inspect_err(|err| error!(error = %err, "entity query failed"))?;

        debug!(rows = rows.len(), "entity query");
        Ok(rows)
    }

    /// Listing for callers that page through results: the configured default limit
    /// applies when the filters set none.
    pub async fn query_page(&self, filters: &EntityFilters) -> StoreResult<Vec<Entity>> {
        match (filters.limit, self.default_limit) {
            (None, Some(limit)) => self.query_entities(&filters.clone().limit(limit)).await,
            _ => self.query_entities(filters).await,
        }
    }

    pub async fn query_entities_with_content<T>(
        &self,
        filters: &EntityFilters,
    ) -> StoreResult<Vec<EntityWithContent<T>>>
    where
        T: DeserializeOwned + Default,
    {
        let rows = self.query_entities(filters).await?;
        Ok(rows.into_iter().map(Entity::with_content).collect())
    }

    /// Partial update. Content is revalidated against the entity's own type; edit
    /// provenance is always stamped.
    pub async fn update_entity(
        &self,
        id: EntityId,
        input: UpdateEntityInput,
        edited_by: Option<UserId>,
    ) -> StoreResult<Entity> {
        let current = self.require_entity(id).await?;
        self.apply_update(current, input, edited_by).await
    }

    /// Replaces the content of an entity of kind `C`, refreshing its title and summary.
    pub async fn update_typed<C: ContentShape>(
        &self,
        id: EntityId,
        content: &C,
        edited_by: Option<UserId>,
    ) -> StoreResult<Entity> {
        let current = self.require_entity(id).await?;
        if current.entity_type != C::KIND.as_str() {
            warn!(entity_id = %id, stored = %current.entity_type, requested = C::KIND.as_str(), "typed update on wrong entity type");
            return Err(EntityError::invalid_content(format!(
                "entity {id} is a {}, not a {}",
                current.entity_type,
                C::KIND
            )));
        }
        content.validate()?;

        let mut input = UpdateEntityInput::new().content(serde_json::to_value(content)?);
        input.title = Some(content.display_title());
        input.summary = Some(content.display_summary());
        self.apply_update(current, input, edited_by).await
    }

    /// Soft delete. `Ok(false)` when no row has that id.
    pub async fn delete_entity(&self, id: EntityId, deleted_by: Option<UserId>) -> StoreResult<bool> {
        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.status = Some(EntityStatus::Deleted);
        changes.deleted = Some(Some(Stamp { by: deleted_by, at: now }));

        let deleted = self.write(id, changes).await?.is_some();
        if deleted {
            info!(entity_id = %id, "entity soft-deleted");
        } else {
            warn!(entity_id = %id, "soft delete of missing entity");
        }
        Ok(deleted)
    }

    /// Removes the row. Children are left in place.
    pub async fn permanently_delete_entity(&self, id: EntityId) -> StoreResult<bool> {
        let removed = self
            .datastore
            .delete_entity(id)
            .await
            .inspect_err(|err| error!(entity_id = %id, error = %err, "failed to delete entity"))?;
        if removed {
            info!(entity_id = %id, "entity permanently deleted");
        }
        Ok(removed)
    }

    /// Re-parents an entity. Only `parent_id` and edit provenance change; content is
    /// left as is, so callers that mirror the parent inside content use
    /// [`EntityStore::relocate_entity`] instead.
    ///
    /// Self-parenting is rejected. Deeper cycles are not detected.
    pub async fn move_entity(
        &self,
        id: EntityId,
        new_parent_id: Option<EntityId>,
        edited_by: Option<UserId>,
    ) -> StoreResult<Entity> {
        reject_self_parent(id, new_parent_id)?;

        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.parent_id = Some(new_parent_id);
        changes.edited = Some(Stamp { by: edited_by, at: now });

        let moved = self.write(id, changes).await?.ok_or_else(|| not_found(id))?;
        info!(entity_id = %id, parent_id = ?new_parent_id, "entity moved");
        Ok(moved)
    }

    /// Re-parents an entity and replaces its content in a single write.
    pub async fn relocate_entity(
        &self,
        id: EntityId,
        new_parent_id: Option<EntityId>,
        content: JsonValue,
        edited_by: Option<UserId>,
    ) -> StoreResult<Entity> {
        reject_self_parent(id, new_parent_id)?;

        let current = self.require_entity(id).await?;
        self.schemas.validate(&current.entity_type, &content).await?;

        let parent_type = match new_parent_id {
            Some(parent_id) => Some(self.require_entity(parent_id).await?.entity_type),
            None => None,
        };

        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.parent_id = Some(new_parent_id);
        changes.parent_type = Some(parent_type);
        changes.content = Some(Some(serde_json::to_string(&content)?));
        changes.edited = Some(Stamp { by: edited_by, at: now });

        let relocated = self.write(id, changes).await?.ok_or_else(|| not_found(id))?;
        info!(entity_id = %id, parent_id = ?new_parent_id, "entity relocated");
        Ok(relocated)
    }

    /// Reverses a soft delete.
    pub async fn restore_entity(&self, id: EntityId, restored_by: Option<UserId>) -> StoreResult<Entity> {
        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.status = Some(EntityStatus::Approved);
        changes.deleted = Some(None);
        changes.edited = Some(Stamp { by: restored_by, at: now });

        let restored = self.write(id, changes).await?.ok_or_else(|| not_found(id))?;
        info!(entity_id = %id, "entity restored");
        Ok(restored)
    }

    /// Adjusts the thread counter and activity timestamp without marking the entity edited.
    pub async fn record_thread_activity(
        &self,
        id: EntityId,
        delta: i32,
        at: DateTime<Utc>,
    ) -> StoreResult<Entity> {
        let mut changes = EntityChanges::at(at);
        changes.thread_count_delta = Some(delta);
        changes.last_activity_at = Some(at);

        self.write(id, changes).await?.ok_or_else(|| not_found(id))
    }

    pub async fn get_entity_children(
        &self,
        parent_id: EntityId,
        filters: EntityFilters,
    ) -> StoreResult<Vec<Entity>> {
        self.query_entities(&filters.parent(Some(parent_id))).await
    }

    pub async fn get_entity_children_with_content<T>(
        &self,
        parent_id: EntityId,
        filters: EntityFilters,
    ) -> StoreResult<Vec<EntityWithContent<T>>>
    where
        T: DeserializeOwned + Default,
    {
        self.query_entities_with_content(&filters.parent(Some(parent_id)))
            .await
    }

    async fn apply_update(
        &self,
        current: Entity,
        input: UpdateEntityInput,
        edited_by: Option<UserId>,
    ) -> StoreResult<Entity> {
        let content = match input.content {
            Some(Some(content)) => {
                self.schemas.validate(&current.entity_type, &content).await?;
                Some(Some(serde_json::to_string(&content)?))
            }
            Some(None) => Some(None),
            None => None,
        };

        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.title = input.title;
        changes.summary = input.summary;
        changes.content = content;
        changes.metadata = input.metadata;
        changes.status = input.status;
        changes.encryption_type = input.encryption_type;
        changes.edited = Some(Stamp { by: edited_by, at: now });

        let updated = self
            .write(current.id, changes)
            .await?
            .ok_or_else(|| not_found(current.id))?;
        info!(entity_id = %updated.id, entity_type = %updated.entity_type, "entity updated");
        Ok(updated)
    }

    async fn write(&self, id: EntityId, changes: EntityChanges) -> StoreResult<Option<Entity>> {
        self.datastore
            .update_entity(id, changes)
            .await
            .inspect_err(|err| error!(entity_id = %id, error = %err, "failed to update entity"))
    }

    async fn require_entity(&self, id: EntityId) -> StoreResult<Entity> {
        self.get_entity(id).await?.ok_or_else(|| not_found(id))
    }

    async fn require_schema(&self, entity_type: &str) -> StoreResult<()> {
        if self.schemas.get_entity_schema(entity_type).await?.is_none() {
            warn!(entity_type, "no active schema for entity type");
            return Err(EntityError::SchemaMissing(entity_type.to_string()));
        }
        Ok(())
    }

    async fn parent_type_of(&self, parent_id: EntityId) -> StoreResult<Option<String>> {
        let parent = self.get_entity(parent_id).await?;
        if parent.is_none() {
            debug!(parent_id = %parent_id, "parent not found, leaving parent_type unset");
        }
        Ok(parent.map(|parent| parent.entity_type))
    }
}

fn reject_self_parent(id: EntityId, new_parent_id: Option<EntityId>) -> StoreResult<()> {
    if new_parent_id == Some(id) {
        warn!(entity_id = %id, "refusing to make an entity its own parent");
        return Err(EntityError::InvalidValue(format!("entity {id} cannot be its own parent")));
    }
    Ok(())
}

fn not_found(id: EntityId) -> EntityError {
    warn!(entity_id = %id, "entity not found");
    EntityError::NotFound(id)
}
