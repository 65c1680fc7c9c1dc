use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use teamspace::core::JsonMap;
use teamspace::model::{OrderBy, OrderDirection};
use teamspace::{
    CreateEntityInput, EntityError, EntityFilters, EntityStatus, EntityStore, InMemoryDatastore,
    SpaceId, UpdateEntityInput, UserId,
};

async fn setup() -> (EntityStore, Arc<InMemoryDatastore>) {
    let datastore = Arc::new(InMemoryDatastore::new());
    let store = EntityStore::new(datastore.clone());
    store.schemas().provision_defaults().await.unwrap();
    (store, datastore)
}

async fn folder(store: &EntityStore, space: SpaceId, name: &str) -> teamspace::Entity {
    store
        .create_entity(CreateEntityInput::new(space, "folder").content(json!({ "name": name })))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_content_round_trips_for_every_builtin_type() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    let id = "0b7f1d2e-8f3a-4c55-9a61-2f1f0d6c9e10";

    let samples = [
        ("project", json!({"name": "Apollo", "color": "#ff0000", "tags": ["a", "b"]})),
        ("project_list", json!({"name": "Backlog", "project_id": id, "position": 2})),
        (
            "project_task",
            json!({"title": "Ship", "project_id": id, "status": "todo", "priority": "high",
                   "nested": {"depth": [1, 2, {"x": null}]}}),
        ),
        ("event", json!({"title": "Standup", "start_time": "2026-03-02T09:00:00Z"})),
        ("vote", json!({"title": "Lunch", "vote_options": ["Tacos", "Ramen"]})),
        ("vote_submission", json!({"vote_id": id, "choice_index": 0})),
        ("comment", json!({"body": "Looks good", "mentions": []})),
        ("file", json!({"name": "a.pdf", "storage_path": "space/a.pdf", "size_bytes": 1024})),
        ("folder", json!({"name": "Specs"})),
    ];

    for (entity_type, content) in samples {
        let created = store
            .create_entity(CreateEntityInput::new(space, entity_type).content(content.clone()))
            .await
            .unwrap();
        let fetched = store
            .get_entity_with_content::<JsonValue>(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.parsed_content, content, "round trip of {entity_type}");
        assert_eq!(fetched.entity_type, entity_type);
    }
}

#[tokio::test]
async fn test_missing_required_field_blocks_insert() {
    let (store, datastore) = setup().await;
    let space = SpaceId::new_v4();

    let attempts = [
        json!({"start_time": "2026-03-02T09:00:00Z"}),
        json!({"title": "", "start_time": "2026-03-02T09:00:00Z"}),
        json!({"title": null, "start_time": "2026-03-02T09:00:00Z"}),
    ];
    for content in attempts {
        let err = store
            .create_entity(CreateEntityInput::new(space, "event").content(content))
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::Validation { ref entity_type, .. } if entity_type == "event"));
    }

    assert_eq!(datastore.row_count().await, 0);
}

#[tokio::test]
async fn test_unknown_type_is_rejected_without_insert() {
    let (store, datastore) = setup().await;

    let err = store
        .create_entity(
            CreateEntityInput::new(SpaceId::new_v4(), "nonexistent_type").content(json!({"a": 1})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EntityError::SchemaMissing(ref kind) if kind == "nonexistent_type"));
    assert_eq!(datastore.row_count().await, 0);
}

#[tokio::test]
async fn test_soft_delete_hides_from_active_queries() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    let user = UserId::new_v4();
    let kept = folder(&store, space, "Kept").await;
    let doomed = folder(&store, space, "Doomed").await;

    assert!(store.delete_entity(doomed.id, Some(user)).await.unwrap());

    let active = store
        .query_entities(&EntityFilters::new().space(space).status(EntityStatus::Approved))
        .await
        .unwrap();
    let ids: Vec<_> = active.iter().map(|entity| entity.id).collect();
    assert_eq!(ids, vec![kept.id]);

    let row = store.get_entity(doomed.id).await.unwrap().unwrap();
    assert_eq!(row.status, EntityStatus::Deleted);
    assert_eq!(row.deleted_by, Some(user));
    assert!(row.deleted_at.is_some());

    let everything = store.query_entities(&EntityFilters::new().space(space)).await.unwrap();
    assert_eq!(everything.len(), 2);
}

#[tokio::test]
async fn test_soft_delete_of_missing_row_reports_false() {
    let (store, _) = setup().await;
    assert!(!store.delete_entity(uuid::Uuid::new_v4(), None).await.unwrap());
    assert!(!store.permanently_delete_entity(uuid::Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_removes_row_but_not_children() {
    let (store, datastore) = setup().await;
    let space = SpaceId::new_v4();
    let parent = folder(&store, space, "Parent").await;
    let child = store
        .create_entity(
            CreateEntityInput::new(space, "folder")
                .parent_id(Some(parent.id))
                .content(json!({"name": "Child"})),
        )
        .await
        .unwrap();

    assert!(store.permanently_delete_entity(parent.id).await.unwrap());
    assert!(store.get_entity(parent.id).await.unwrap().is_none());
    assert!(store.get_entity(child.id).await.unwrap().is_some());
    assert_eq!(datastore.row_count().await, 1);
}

#[tokio::test]
async fn test_partial_update_touches_only_given_fields() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    let editor = UserId::new_v4();

    let mut metadata = JsonMap::new();
    metadata.insert("pinned".into(), json!(true));
    let created = store
        .create_entity(
            CreateEntityInput::new(space, "project")
                .title("Old")
                .summary("Summary")
                .metadata(metadata.clone())
                .content(json!({"name": "Apollo"})),
        )
        .await
        .unwrap();

    let updated = store
        .update_entity(created.id, UpdateEntityInput::new().title("new"), Some(editor))
        .await
        .unwrap();

    assert_eq!(updated.title.as_deref(), Some("new"));
    assert_eq!(updated.summary.as_deref(), Some("Summary"));
    assert_eq!(updated.content, created.content);
    assert_eq!(updated.metadata, metadata);
    assert_eq!(updated.status, created.status);
    assert!(updated.is_edited);
    assert_eq!(updated.edited_by, Some(editor));
    assert!(updated.edited_at.is_some());
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn test_update_revalidates_content_against_stored_type() {
    let (store, _) = setup().await;
    let created = store
        .create_entity(CreateEntityInput::new(SpaceId::new_v4(), "project").content(json!({"name": "A"})))
        .await
        .unwrap();

    let err = store
        .update_entity(created.id, UpdateEntityInput::new().content(json!({"color": "red"})), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EntityError::Validation { ref entity_type, .. } if entity_type == "project"));

    let cleared = store
        .update_entity(created.id, UpdateEntityInput::new().clear_content(), None)
        .await
        .unwrap();
    assert_eq!(cleared.content, None);
}

#[tokio::test]
async fn test_update_of_missing_entity_is_not_found() {
    let (store, _) = setup().await;
    let missing = uuid::Uuid::new_v4();
    let err = store
        .update_entity(missing, UpdateEntityInput::new().title("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EntityError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn test_null_parent_filter_differs_from_unspecified() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    let root = folder(&store, space, "Root").await;
    let nested = store
        .create_entity(
            CreateEntityInput::new(space, "folder")
                .parent_id(Some(root.id))
                .content(json!({"name": "Nested"})),
        )
        .await
        .unwrap();

    let roots = store
        .query_entities(&EntityFilters::new().space(space).parent(None))
        .await
        .unwrap();
    assert_eq!(roots.iter().map(|e| e.id).collect::<Vec<_>>(), vec![root.id]);

    let all = store.query_entities(&EntityFilters::new().space(space)).await.unwrap();
    assert_eq!(all.len(), 2);

    let children = store
        .get_entity_children(root.id, EntityFilters::new())
        .await
        .unwrap();
    assert_eq!(children.iter().map(|e| e.id).collect::<Vec<_>>(), vec![nested.id]);
}

#[tokio::test]
async fn test_corrupt_content_reads_as_empty_object() {
    let (store, datastore) = setup().await;
    let created = folder(&store, SpaceId::new_v4(), "Fine").await;

    let mut corrupt = created.clone();
    corrupt.content = Some("{not json".to_string());
    datastore.put_raw(corrupt).await;

    let fetched = store
        .get_entity_with_content::<JsonValue>(created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.parsed_content, json!({}));
    assert_eq!(fetched.content.as_deref(), Some("{not json"));

    let listed = store
        .query_entities_with_content::<JsonValue>(&EntityFilters::new())
        .await
        .unwrap();
    assert_eq!(listed[0].parsed_content, json!({}));
}

#[tokio::test]
async fn test_query_orders_and_paginates() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    for name in ["Charlie", "Alpha", "Bravo", "Delta"] {
        store
            .create_entity(
                CreateEntityInput::new(space, "folder")
                    .title(name)
                    .content(json!({ "name": name })),
            )
            .await
            .unwrap();
    }

    let page = store
        .query_entities(
            &EntityFilters::new()
                .space(space)
                .order(OrderBy::Title, OrderDirection::Asc)
                .offset(1)
                .limit(2),
        )
        .await
        .unwrap();
    let titles: Vec<_> = page.iter().filter_map(|e| e.title.as_deref()).collect();
    assert_eq!(titles, vec!["Bravo", "Charlie"]);

    let newest_first = store
        .query_entities(&EntityFilters::new().space(space))
        .await
        .unwrap();
    assert_eq!(newest_first.len(), 4);
    assert!(
        newest_first
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
async fn test_type_and_status_filters_accept_several_values() {
    let (store, _) = setup().await;
    let space = SpaceId::new_v4();
    folder(&store, space, "A").await;
    store
        .create_entity(
            CreateEntityInput::new(space, "project")
                .status(EntityStatus::Draft)
                .content(json!({"name": "Draft project"})),
        )
        .await
        .unwrap();
    store
        .create_entity(CreateEntityInput::new(space, "comment").content(json!({"body": "hi"})))
        .await
        .unwrap();

    let typed = store
        .query_entities(&EntityFilters::new().space(space).entity_types(["folder", "project"]))
        .await
        .unwrap();
    assert_eq!(typed.len(), 2);

    let drafts_or_live = store
        .query_entities(
            &EntityFilters::new()
                .space(space)
                .statuses([EntityStatus::Draft, EntityStatus::PendingApproval]),
        )
        .await
        .unwrap();
    assert_eq!(drafts_or_live.len(), 1);
    assert_eq!(drafts_or_live[0].entity_type, "project");
}
