use crate::core::{EncryptionType, EntityId, EntityStatus, JsonMap, SpaceId, UserId};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Everything needed to insert a new entity row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntityInput {
    pub space_id: SpaceId,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    #[serde(default)]
    pub parent_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<JsonValue>,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
    #[serde(default)]
    pub status: Option<EntityStatus>,
    #[serde(default)]
    pub encryption_type: Option<EncryptionType>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl CreateEntityInput {
    pub fn new(space_id: SpaceId, entity_type: impl Into<String>) -> Self {
        Self {
            space_id,
            entity_type: entity_type.into(),
            parent_id: None,
            parent_type: None,
            title: None,
            summary: None,
            content: None,
            metadata: None,
            status: None,
            encryption_type: None,
            created_by: None,
        }
    }

    pub fn parent(mut self, parent_id: EntityId, parent_type: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id);
        self.parent_type = Some(parent_type.into());
        self
    }

    pub fn parent_id(mut self, parent_id: Option<EntityId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn content(mut self, content: JsonValue) -> Self {
        self.content = Some(content);
        self
    }

    pub fn metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn encryption_type(mut self, encryption_type: EncryptionType) -> Self {
        self.encryption_type = Some(encryption_type);
        self
    }

    pub fn created_by(mut self, user_id: Option<UserId>) -> Self {
        self.created_by = user_id;
        self
    }
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears a nullable column.
///
/// When deserialized, an absent field is `None` and an explicit `null` is `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntityInput {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub summary: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<JsonValue>>,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
    #[serde(default)]
    pub status: Option<EntityStatus>,
    #[serde(default)]
    pub encryption_type: Option<EncryptionType>,
}

impl UpdateEntityInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(Some(summary.into()));
        self
    }

    pub fn clear_summary(mut self) -> Self {
        self.summary = Some(None);
        self
    }

    pub fn content(mut self, content: JsonValue) -> Self {
        self.content = Some(Some(content));
        self
    }

    pub fn clear_content(mut self) -> Self {
        self.content = Some(None);
        self
    }

    pub fn metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn encryption_type(mut self, encryption_type: EncryptionType) -> Self {
        self.encryption_type = Some(encryption_type);
        self
    }

    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.summary.is_some()
            || self.content.is_some()
            || self.metadata.is_some()
            || self.status.is_some()
            || self.encryption_type.is_some()
    }
}

/// Only called for fields that appear in the input, so `null` maps to `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_builder_distinguishes_clear_from_untouched() {
        let update = UpdateEntityInput::new().title("renamed").clear_content();
        assert_eq!(update.title, Some(Some("renamed".to_string())));
        assert_eq!(update.content, Some(None));
        assert!(update.summary.is_none());
        assert!(update.has_changes());
        assert!(!UpdateEntityInput::new().has_changes());
    }

    #[test]
    fn create_input_deserializes_with_defaults() {
        let space = SpaceId::new_v4();
        let input: CreateEntityInput = serde_json::from_value(json!({
            "space_id": space,
            "type": "project",
            "content": {"name": "Roadmap"}
        }))
        .unwrap();
        assert_eq!(input.entity_type, "project");
        assert!(input.parent_id.is_none());
        assert!(input.status.is_none());
    }

    #[test]
    fn update_input_keeps_explicit_null_apart_from_absent() {
        let cleared: UpdateEntityInput =
            serde_json::from_value(json!({"content": null, "title": "kept"})).unwrap();
        assert_eq!(cleared.content, Some(None));
        assert_eq!(cleared.title, Some(Some("kept".to_string())));
        assert!(cleared.summary.is_none());

        let replaced: UpdateEntityInput =
            serde_json::from_value(json!({"content": {"name": "x"}})).unwrap();
        assert_eq!(replaced.content, Some(Some(json!({"name": "x"}))));

        let untouched: UpdateEntityInput = serde_json::from_value(json!({})).unwrap();
        assert!(!untouched.has_changes());
    }
}
