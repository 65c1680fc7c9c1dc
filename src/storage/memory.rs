use super::{Datastore, EntityChanges};
use crate::core::{EntityError, EntityId, StoreResult};
use crate::model::{Entity, EntityFilters};
use crate::schema::EntitySchema;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local datastore. Rows live for as long as the value does.
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    entities: RwLock<HashMap<EntityId, Entity>>,
    schemas: RwLock<Vec<EntitySchema>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a row as-is, bypassing the entity store. Used to seed fixtures.
    pub async fn put_raw(&self, entity: Entity) {
        self.entities.write().await.insert(entity.id, entity);
    }

    pub async fn row_count(&self) -> usize {
        self.entities.read().await.len()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_entity(&self, entity: Entity) -> StoreResult<Entity> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(&entity.id) {
            return Err(EntityError::storage(format!(
                "duplicate key value violates unique constraint: entities.id = {}",
                entity.id
            )));
        }
        entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn fetch_entity(&self, id: EntityId) -> StoreResult<Option<Entity>> {
        Ok(self.entities.read().await.get(&id).cloned())
    }

    async fn query_entities(&self, filters: &EntityFilters) -> StoreResult<Vec<Entity>> {
        let entities = self.entities.read().await;
        let rows = filters.apply(entities.values().cloned());
        debug!(rows = rows.len(), "in-memory entity scan");
        Ok(rows)
    }

    async fn update_entity(&self, id: EntityId, changes: EntityChanges) -> StoreResult<Option<Entity>> {
        let mut entities = self.entities.write().await;
        let Some(entity) = entities.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(entity);
        Ok(Some(entity.clone()))
    }

    async fn delete_entity(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.entities.write().await.remove(&id).is_some())
    }

    async fn active_schema(&self, entity_type: &str) -> StoreResult<Option<EntitySchema>> {
        let schemas = self.schemas.read().await;
        Ok(schemas
            .iter()
            .filter(|schema| schema.is_active && schema.entity_type == entity_type)
            .max_by_key(|schema| schema.version)
            .cloned())
    }

    async fn active_schemas(&self) -> StoreResult<Vec<EntitySchema>> {
        let schemas = self.schemas.read().await;
        let mut active: Vec<EntitySchema> = schemas
            .iter()
            .filter(|schema| schema.is_active)
            .cloned()
            .collect();
        active.sort_by(|left, right| left.entity_type.cmp(&right.entity_type));
        Ok(active)
    }

    async fn register_schema(&self, schema: EntitySchema) -> StoreResult<()> {
        let mut schemas = self.schemas.write().await;
        if schema.is_active {
            for existing in schemas
                .iter_mut()
                .filter(|existing| existing.entity_type == schema.entity_type)
            {
                existing.is_active = false;
            }
        }
        schemas.retain(|existing| {
            !(existing.entity_type == schema.entity_type && existing.version == schema.version)
        });
        schemas.push(schema);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
