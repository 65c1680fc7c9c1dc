use super::{EntitySchema, default_schemas, validate_content};
use crate::core::{EntityError, StoreResult};
use crate::storage::Datastore;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lookup of the active validation contract for each entity type.
#[derive(Clone)]
pub struct SchemaRegistry {
    datastore: Arc<dyn Datastore>,
}

impl SchemaRegistry {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    /// The active schema for `entity_type`, or `None` when the type is not provisioned.
    pub async fn get_entity_schema(&self, entity_type: &str) -> StoreResult<Option<EntitySchema>> {
        self.datastore
            .active_schema(entity_type)
            .await
            .inspect_err(|err| error!(entity_type, error = %err, "schema lookup failed"))
    }

    /// All active schemas ordered by type.
    pub async fn get_all_entity_schemas(&self) -> StoreResult<Vec<EntitySchema>> {
        self.datastore
            .active_schemas()
            .await
            .inspect_err(|err| error!(error = %err, "schema listing failed"))
    }

    /// Registers a new active version of the schema for `entity_type`.
    pub async fn register_schema(
        &self,
        entity_type: &str,
        required_fields: &[&str],
    ) -> StoreResult<EntitySchema> {
        let version = match self.datastore.active_schema(entity_type).await? {
            Some(current) => current.version + 1,
            None => 1,
        };
        let schema = EntitySchema::from_required(entity_type, version, required_fields);
        self.datastore.register_schema(schema.clone()).await?;
        info!(entity_type, version, "registered entity schema");
        Ok(schema)
    }

    /// Registers the built-in schema of every known kind that has no active schema yet.
    /// Returns the types that were provisioned.
    pub async fn provision_defaults(&self) -> StoreResult<Vec<String>> {
        let mut provisioned = Vec::new();
        for schema in default_schemas() {
            if self.datastore.active_schema(&schema.entity_type).await?.is_some() {
                continue;
            }
            provisioned.push(schema.entity_type.clone());
            self.datastore.register_schema(schema).await?;
        }
        if !provisioned.is_empty() {
            info!(types = ?provisioned, "provisioned built-in entity schemas");
        }
        Ok(provisioned)
    }

    /// Write gate: the type must be provisioned and `content` must carry every required field.
    pub async fn validate(&self, entity_type: &str, content: &JsonValue) -> StoreResult<()> {
        let Some(schema) = self.get_entity_schema(entity_type).await? else {
            warn!(entity_type, "no active schema for entity type");
            return Err(EntityError::SchemaMissing(entity_type.to_string()));
        };

        validate_content(content, &schema).map_err(|failure| {
            warn!(entity_type, version = schema.version, %failure, "content failed schema validation");
            EntityError::validation(entity_type, failure.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDatastore;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(Arc::new(InMemoryDatastore::new()))
    }

    #[tokio::test]
    async fn unknown_type_has_no_schema() {
        let registry = registry();
        assert!(registry.get_entity_schema("wiki_page").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_bumps_version() {
        let registry = registry();
        let first = registry
            .register_schema("wiki_page", &["title"])
            .await
            .unwrap();
        let second = registry
            .register_schema("wiki_page", &["title", "body"])
            .await
            .unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);

        let active = registry.get_entity_schema("wiki_page").await.unwrap().unwrap();
        assert_eq!(active.required_fields(), vec!["title", "body"]);
    }

    #[tokio::test]
    async fn provisioning_skips_types_already_registered() {
        let registry = registry();
        registry
            .register_schema("project", &["name", "owner"])
            .await
            .unwrap();

        let provisioned = registry.provision_defaults().await.unwrap();
        assert!(!provisioned.contains(&"project".to_string()));
        assert_eq!(provisioned.len(), 8);

        let project = registry.get_entity_schema("project").await.unwrap().unwrap();
        assert_eq!(project.required_fields(), vec!["name", "owner"]);

        assert!(registry.provision_defaults().await.unwrap().is_empty());

        let all = registry.get_all_entity_schemas().await.unwrap();
        let types: Vec<_> = all.iter().map(|schema| schema.entity_type.as_str()).collect();
        let mut sorted = types.clone();
        sorted.sort();
        assert_eq!(types, sorted);
    }

    #[tokio::test]
    async fn validate_distinguishes_missing_schema_from_bad_content() {
        let registry = registry();
        registry.register_schema("event", &["title", "start_time"]).await.unwrap();

        let missing = registry.validate("poll", &json!({})).await;
        assert!(matches!(missing, Err(EntityError::SchemaMissing(kind)) if kind == "poll"));

        let invalid = registry.validate("event", &json!({"title": "Standup"})).await;
        assert!(matches!(
            invalid,
            Err(EntityError::Validation { ref reason, .. }) if reason.contains("start_time")
        ));

        let content = json!({"title": "Standup", "start_time": "2026-01-05T09:00:00Z"});
        assert!(registry.validate("event", &content).await.is_ok());
    }
}
