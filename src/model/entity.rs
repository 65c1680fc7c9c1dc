use crate::core::{EncryptionType, EntityId, EntityStatus, JsonMap, SpaceId, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::ops::Deref;
use tracing::warn;

/// A row of the `entities` table.
///
/// `content` is kept exactly as stored (JSON text); the store never interprets it
/// beyond the schema presence check performed on writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub space_id: SpaceId,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub parent_id: Option<EntityId>,
    pub parent_type: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: JsonMap,
    pub status: EntityStatus,
    pub encryption_type: EncryptionType,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub edited_by: Option<UserId>,
    pub deleted_by: Option<UserId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub thread_count: i32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn is_deleted(&self) -> bool {
        self.status == EntityStatus::Deleted
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Parses `content` leniently: missing or malformed content becomes `{}`,
    /// and content that does not fit `T` becomes `T::default()`.
    pub fn parse_content<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        let value = match self.content.as_deref() {
            None => JsonValue::Object(JsonMap::new()),
            Some(raw) => match serde_json::from_str::<JsonValue>(raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(entity_id = %self.id, error = %err, "entity content is not valid JSON, using empty content");
                    JsonValue::Object(JsonMap::new())
                }
            },
        };

        match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(
                    entity_id = %self.id,
                    entity_type = %self.entity_type,
                    error = %err,
                    "entity content does not match the requested shape, using default"
                );
                T::default()
            }
        }
    }

    /// Top-level field of the stored content, if the content is a JSON object.
    pub fn content_field(&self, key: &str) -> Option<JsonValue> {
        let raw = self.content.as_deref()?;
        let value: JsonValue = serde_json::from_str(raw).ok()?;
        value.get(key).cloned()
    }

    pub fn with_content<T>(self) -> EntityWithContent<T>
    where
        T: DeserializeOwned + Default,
    {
        let parsed_content = self.parse_content();
        EntityWithContent {
            entity: self,
            parsed_content,
        }
    }
}

/// An entity together with its content parsed into `T`.
#[derive(Debug, Clone, Serialize)]
pub struct EntityWithContent<T = JsonValue> {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(rename = "parsedContent")]
    pub parsed_content: T,
}

impl<T> Deref for EntityWithContent<T> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

#[cfg(test)]
pub(crate) fn sample_entity(entity_type: &str, content: Option<&str>) -> Entity {
    let now = Utc::now();
    Entity {
        id: EntityId::new_v4(),
        space_id: SpaceId::new_v4(),
        entity_type: entity_type.to_string(),
        parent_id: None,
        parent_type: None,
        title: None,
        summary: None,
        content: content.map(str::to_string),
        metadata: JsonMap::new(),
        status: EntityStatus::Approved,
        encryption_type: EncryptionType::None,
        is_edited: false,
        edited_at: None,
        edited_by: None,
        deleted_by: None,
        deleted_at: None,
        thread_count: 0,
        last_activity_at: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}
