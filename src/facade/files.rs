//! Folder tree and file references. File bytes live in object storage; only the
//! storage path is recorded here.

use crate::content::{ContentShape, File, Folder};
use crate::core::{EntityId, SpaceId, StoreResult, UserId};
use crate::model::{Entity, EntityFilters, EntityWithContent, OrderBy, OrderDirection};
use crate::store::{EntityPlacement, EntityStore};

pub async fn create_folder(
    store: &EntityStore,
    space_id: SpaceId,
    folder: &Folder,
    parent_folder_id: Option<EntityId>,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<Folder>> {
    let entity = store
        .create_typed(space_id, folder, in_folder(parent_folder_id).by(created_by))
        .await?;
    Ok(entity.with_content())
}

/// Records an uploaded file, inside `file.folder_id` when set.
pub async fn register_file(
    store: &EntityStore,
    space_id: SpaceId,
    file: &File,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<File>> {
    let entity = store
        .create_typed(space_id, file, in_folder(file.folder_id).by(created_by))
        .await?;
    Ok(entity.with_content())
}

/// Live folders and files directly inside `folder_id` (the space root when `None`),
/// sorted by name.
pub async fn folder_contents(
    store: &EntityStore,
    space_id: SpaceId,
    folder_id: Option<EntityId>,
) -> StoreResult<Vec<Entity>> {
    let filters = EntityFilters::active()
        .space(space_id)
        .entity_types([Folder::KIND.as_str(), File::KIND.as_str()])
        .parent(folder_id)
        .order(OrderBy::Title, OrderDirection::Asc);
    store.query_entities(&filters).await
}

fn in_folder(folder_id: Option<EntityId>) -> EntityPlacement {
    match folder_id {
        Some(folder_id) => EntityPlacement::under(folder_id, Folder::KIND.as_str()),
        None => EntityPlacement::root(),
    }
}
