use serde_json::json;
use std::sync::Arc;
use teamspace::{CreateEntityInput, EntityError, EntityStore, InMemoryDatastore, SpaceId};

#[tokio::test]
async fn test_runtime_registered_type_is_accepted() {
    let store = EntityStore::new(Arc::new(InMemoryDatastore::new()));
    let space = SpaceId::new_v4();

    let before = store
        .create_entity(CreateEntityInput::new(space, "wiki_page").content(json!({"title": "Home"})))
        .await;
    assert!(matches!(before, Err(EntityError::SchemaMissing(_))));

    store.schemas().register_schema("wiki_page", &["title"]).await.unwrap();

    let page = store
        .create_entity(CreateEntityInput::new(space, "wiki_page").content(json!({"title": "Home"})))
        .await
        .unwrap();
    assert_eq!(page.entity_type, "wiki_page");
}

#[tokio::test]
async fn test_new_schema_version_governs_later_writes() {
    let store = EntityStore::new(Arc::new(InMemoryDatastore::new()));
    let space = SpaceId::new_v4();
    store.schemas().register_schema("wiki_page", &["title"]).await.unwrap();
    let v2 = store
        .schemas()
        .register_schema("wiki_page", &["title", "body"])
        .await
        .unwrap();
    assert_eq!(v2.version, 2);

    let err = store
        .create_entity(CreateEntityInput::new(space, "wiki_page").content(json!({"title": "Home"})))
        .await
        .unwrap_err();
    assert!(matches!(err, EntityError::Validation { ref reason, .. } if reason.contains("body")));

    let active = store.schemas().get_all_entity_schemas().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].version, 2);
}

#[tokio::test]
async fn test_schema_with_no_required_fields_accepts_any_content() {
    let store = EntityStore::new(Arc::new(InMemoryDatastore::new()));
    store.schemas().register_schema("note", &[]).await.unwrap();

    let note = store
        .create_entity(CreateEntityInput::new(SpaceId::new_v4(), "note").content(json!("plain text")))
        .await
        .unwrap();
    assert_eq!(note.content.as_deref(), Some("\"plain text\""));
}
