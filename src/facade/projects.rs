//! Projects and kanban boards.
//!
//! A project owns lists, a list owns tasks and a task owns its subtasks. A task that has
//! neither a list nor a parent task hangs directly off its project.

use super::require_typed;
use crate::content::{ContentShape, EntityKind, Project, ProjectList, ProjectTask, TaskStatus};
use crate::core::{EntityError, EntityId, SpaceId, StoreResult, UserId};
use crate::model::{EntityFilters, EntityWithContent};
use crate::store::{EntityPlacement, EntityStore};
use chrono::Utc;
use tracing::{info, warn};

pub async fn create_project(
    store: &EntityStore,
    space_id: SpaceId,
    project: &Project,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<Project>> {
    let entity = store
        .create_typed(space_id, project, EntityPlacement::root().by(created_by))
        .await?;
    Ok(entity.with_content())
}

pub async fn create_list(
    store: &EntityStore,
    space_id: SpaceId,
    list: &ProjectList,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<ProjectList>> {
    let placement = EntityPlacement::under(list.project_id, Project::KIND.as_str()).by(created_by);
    let entity = store.create_typed(space_id, list, placement).await?;
    Ok(entity.with_content())
}

pub async fn create_task(
    store: &EntityStore,
    space_id: SpaceId,
    task: &ProjectTask,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<ProjectTask>> {
    let (parent_id, parent_kind) = task_parent(task);
    let placement = EntityPlacement::under(parent_id, parent_kind.as_str()).by(created_by);
    let entity = store.create_typed(space_id, task, placement).await?;
    Ok(entity.with_content())
}

/// The row a task hangs off: its parent task, else its list, else its project.
pub fn task_parent(task: &ProjectTask) -> (EntityId, EntityKind) {
    match (task.parent_task_id, task.list_id) {
        (Some(parent_task_id), _) => (parent_task_id, EntityKind::ProjectTask),
        (None, Some(list_id)) => (list_id, EntityKind::ProjectList),
        (None, None) => (task.project_id, EntityKind::Project),
    }
}

/// Replaces a task's content. Project, list and parent task must stay as stored;
/// moving between lists goes through [`move_task`].
pub async fn update_task(
    store: &EntityStore,
    task_id: EntityId,
    task: &ProjectTask,
    edited_by: Option<UserId>,
) -> StoreResult<EntityWithContent<ProjectTask>> {
    let current = require_typed::<ProjectTask>(store, task_id).await?.parsed_content;
    if task_parent(task) != task_parent(&current) || task.project_id != current.project_id {
        warn!(task_id = %task_id, "task update tried to change its placement");
        return Err(EntityError::InvalidValue(format!(
            "task {task_id} cannot change project, list or parent task in an update; use move_task"
        )));
    }

    let entity = store.update_typed(task_id, task, edited_by).await?;
    Ok(entity.with_content())
}

/// Sets the workflow status. Any status may follow any other; `completed_at` tracks `done`.
pub async fn set_task_status(
    store: &EntityStore,
    task_id: EntityId,
    status: TaskStatus,
    edited_by: Option<UserId>,
) -> StoreResult<EntityWithContent<ProjectTask>> {
    let current = require_typed::<ProjectTask>(store, task_id).await?;
    if current.parsed_content.status == status {
        return Ok(current);
    }

    let mut task = current.parsed_content;
    task.completed_at = match status {
        TaskStatus::Done => Some(Utc::now()),
        _ => None,
    };
    task.status = status;
    info!(task_id = %task_id, status = status.as_str(), "task status changed");
    update_task(store, task_id, &task, edited_by).await
}

/// Moves a task onto `list_id` at `position`, in one write.
///
/// A subtask moved onto a list becomes a top-level task of that list. The list must
/// belong to the task's own project and space.
pub async fn move_task(
    store: &EntityStore,
    task_id: EntityId,
    list_id: EntityId,
    position: i64,
    edited_by: Option<UserId>,
) -> StoreResult<EntityWithContent<ProjectTask>> {
    let list = require_typed::<ProjectList>(store, list_id).await?;
    let current = require_typed::<ProjectTask>(store, task_id).await?;

    if list.space_id != current.space_id
        || list.parsed_content.project_id != current.parsed_content.project_id
    {
        warn!(task_id = %task_id, list_id = %list_id, "refusing to move task onto a list of another project");
        return Err(EntityError::InvalidValue(format!(
            "list {list_id} does not belong to the project of task {task_id}"
        )));
    }

    let mut task = current.parsed_content;

    task.list_id = Some(list_id);
    task.parent_task_id = None;
    task.position = position;
    task.validate()?;

    let entity = store
        .relocate_entity(task_id, Some(list_id), serde_json::to_value(&task)?, edited_by)
        .await?;
    Ok(entity.with_content())
}

/// Lists of a project, by position.
pub async fn project_lists(
    store: &EntityStore,
    project_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<ProjectList>>> {
    let filters = EntityFilters::active().entity_type(ProjectList::KIND.as_str());
    let mut lists = store
        .get_entity_children_with_content::<ProjectList>(project_id, filters)
        .await?;
    lists.sort_by_key(|list| list.parsed_content.position);
    Ok(lists)
}

/// Top-level tasks whose content places them on `list_id`, by position.
pub async fn list_tasks(
    store: &EntityStore,
    list_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<ProjectTask>>> {
    let filters = EntityFilters::active()
        .entity_type(ProjectTask::KIND.as_str())
        .content_eq("list_id", list_id.to_string());
    let mut tasks: Vec<_> = store
        .query_entities_with_content::<ProjectTask>(&filters)
        .await?
        .into_iter()
        .filter(|task| !task.parsed_content.is_subtask())
        .collect();
    tasks.sort_by_key(|task| task.parsed_content.position);
    Ok(tasks)
}

/// Every task of a project, subtasks included.
pub async fn project_tasks(
    store: &EntityStore,
    project_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<ProjectTask>>> {
    let filters = EntityFilters::active()
        .entity_type(ProjectTask::KIND.as_str())
        .content_eq("project_id", project_id.to_string());
    store.query_entities_with_content(&filters).await
}

pub async fn subtasks(
    store: &EntityStore,
    task_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<ProjectTask>>> {
    let filters = EntityFilters::active().entity_type(ProjectTask::KIND.as_str());
    let mut subtasks = store
        .get_entity_children_with_content::<ProjectTask>(task_id, filters)
        .await?;
    subtasks.sort_by_key(|task| task.parsed_content.position);
    Ok(subtasks)
}
