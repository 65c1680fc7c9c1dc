//! The relational surface the entity store is written against.
//!
//! Two backends implement [`Datastore`]: [`InMemoryDatastore`] and [`PgDatastore`].

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDatastore;
pub use postgres::PgDatastore;

use crate::core::{EncryptionType, EntityId, EntityStatus, JsonMap, StoreResult, UserId};
use crate::model::{Entity, EntityFilters};
use crate::schema::EntitySchema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Datastore: Send + Sync {
    /// Creates the backing tables when they do not exist yet.
    async fn init(&self) -> StoreResult<()>;

    /// `INSERT INTO entities (...) RETURNING *`
    async fn insert_entity(&self, entity: Entity) -> StoreResult<Entity>;

    /// `SELECT * FROM entities WHERE id = ?`
    async fn fetch_entity(&self, id: EntityId) -> StoreResult<Option<Entity>>;

    /// Filtered, ordered, paginated scan.
    async fn query_entities(&self, filters: &EntityFilters) -> StoreResult<Vec<Entity>>;

    /// Applies every change in one statement. `None` when no row has that id.
    async fn update_entity(&self, id: EntityId, changes: EntityChanges) -> StoreResult<Option<Entity>>;

    /// `DELETE FROM entities WHERE id = ?`
    async fn delete_entity(&self, id: EntityId) -> StoreResult<bool>;

    /// `SELECT * FROM entity_schemas WHERE type = ? AND is_active LIMIT 1`
    async fn active_schema(&self, entity_type: &str) -> StoreResult<Option<EntitySchema>>;

    /// All active schemas ordered by type.
    async fn active_schemas(&self) -> StoreResult<Vec<EntitySchema>>;

    /// Stores `schema`; when it is active, other versions of its type are deactivated.
    async fn register_schema(&self, schema: EntitySchema) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    pub by: Option<UserId>,
    pub at: DateTime<Utc>,
}

/// Column changes for a single-row update. Unset fields keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChanges {
    pub parent_id: Option<Option<EntityId>>,
    pub parent_type: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub summary: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub metadata: Option<JsonMap>,
    pub status: Option<EntityStatus>,
    pub encryption_type: Option<EncryptionType>,
    /// Sets `edited_by`, `edited_at` and `is_edited = true`.
    pub edited: Option<Stamp>,
    /// `Some(None)` clears deletion provenance.
    pub deleted: Option<Option<Stamp>>,
    pub thread_count_delta: Option<i32>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl EntityChanges {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            parent_id: None,
            parent_type: None,
            title: None,
            summary: None,
            content: None,
            metadata: None,
            status: None,
            encryption_type: None,
            edited: None,
            deleted: None,
            thread_count_delta: None,
            last_activity_at: None,
            updated_at,
        }
    }

    /// Applies the changes to an in-memory copy of a row.
    pub fn apply_to(&self, entity: &mut Entity) {
        if let Some(parent_id) = self.parent_id {
            entity.parent_id = parent_id;
        }
        if let Some(parent_type) = &self.parent_type {
            entity.parent_type = parent_type.clone();
        }
        if let Some(title) = &self.title {
            entity.title = title.clone();
        }
        if let Some(summary) = &self.summary {
            entity.summary = summary.clone();
        }
        if let Some(content) = &self.content {
            entity.content = content.clone();
        }
        if let Some(metadata) = &self.metadata {
            entity.metadata = metadata.clone();
        }
        if let Some(status) = self.status {
            entity.status = status;
        }
        if let Some(encryption_type) = self.encryption_type {
            entity.encryption_type = encryption_type;
        }
        if let Some(stamp) = self.edited {
            entity.is_edited = true;
            entity.edited_by = stamp.by;
            entity.edited_at = Some(stamp.at);
        }
        if let Some(deleted) = self.deleted {
            entity.deleted_by = deleted.and_then(|stamp| stamp.by);
            entity.deleted_at = deleted.map(|stamp| stamp.at);
        }
        if let Some(delta) = self.thread_count_delta {
            entity.thread_count = entity.thread_count.saturating_add(delta).max(0);
        }
        if let Some(at) = self.last_activity_at {
            entity.last_activity_at = Some(at);
        }
        entity.updated_at = self.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::sample_entity;

    #[test]
    fn apply_to_touches_only_listed_columns() {
        let mut entity = sample_entity("project", Some(r#"{"name":"a"}"#));
        entity.title = Some("before".to_string());
        entity.summary = Some("keep".to_string());

        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.title = Some(Some("after".to_string()));
        changes.edited = Some(Stamp { by: None, at: now });
        changes.apply_to(&mut entity);

        assert_eq!(entity.title.as_deref(), Some("after"));
        assert_eq!(entity.summary.as_deref(), Some("keep"));
        assert_eq!(entity.content.as_deref(), Some(r#"{"name":"a"}"#));
        assert!(entity.is_edited);
        assert_eq!(entity.edited_at, Some(now));
    }

    #[test]
    fn thread_count_never_goes_negative() {
        let mut entity = sample_entity("event", None);
        let mut changes = EntityChanges::at(Utc::now());
        changes.thread_count_delta = Some(-3);
        changes.apply_to(&mut entity);
        assert_eq!(entity.thread_count, 0);
    }

    #[test]
    fn thread_count_saturates_instead_of_overflowing() {
        let mut entity = sample_entity("comment", None);
        entity.thread_count = i32::MAX - 1;
        let mut changes = EntityChanges::at(Utc::now());
        changes.thread_count_delta = Some(5);
        changes.apply_to(&mut entity);
        assert_eq!(entity.thread_count, i32::MAX);
    }
}
