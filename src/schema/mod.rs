//! Schema registry: one active validation contract per entity type.

pub mod builtin;
pub mod registry;
pub mod validate;

pub use builtin::default_schemas;
pub use registry::SchemaRegistry;
pub use validate::{ValidationFailure, validate_content};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

/// A row of the `entity_schemas` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub version: i32,
    /// JSON-Schema-like document; only its `required` list is enforced.
    pub schema: JsonValue,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<String>, version: i32, schema: JsonValue) -> Self {
        Self {
            entity_type: entity_type.into(),
            version,
            schema,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn from_required(entity_type: impl Into<String>, version: i32, required: &[&str]) -> Self {
        Self::new(
            entity_type,
            version,
            json!({
                "type": "object",
                "required": required,
            }),
        )
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|fields| fields.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_ignore_non_string_entries() {
        let schema = EntitySchema::new("event", 1, json!({"required": ["title", 3, "start_time"]}));
        assert_eq!(schema.required_fields(), vec!["title", "start_time"]);
    }

    #[test]
    fn schema_without_required_list_requires_nothing() {
        let schema = EntitySchema::new("note", 2, json!({"type": "object"}));
        assert!(schema.required_fields().is_empty());
        assert!(schema.is_active);
    }
}
