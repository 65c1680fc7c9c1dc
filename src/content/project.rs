use super::{ContentShape, EntityKind, require_text};
use crate::core::{EntityError, EntityId, StoreResult, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Project {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub member_ids: Vec<UserId>,
    pub archived: bool,
}

impl ContentShape for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn validate(&self) -> StoreResult<()> {
        require_text("project name", &self.name)
    }

    fn display_title(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn display_summary(&self) -> Option<String> {
        self.description.clone()
    }
}

/// A kanban column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectList {
    pub name: String,
    pub project_id: EntityId,
    pub position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ContentShape for ProjectList {
    const KIND: EntityKind = EntityKind::ProjectList;

    fn validate(&self) -> StoreResult<()> {
        require_text("list name", &self.name)?;
        require_id("project_id", self.project_id)
    }

    fn display_title(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
        TaskStatus::Blocked,
    ];

    /// The next step of the usual workflow. `Done` and `Blocked` have none:
    /// leaving `Blocked` is always an explicit choice.
    pub fn next_in_flow(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Todo => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Review),
            TaskStatus::Review => Some(TaskStatus::Done),
            TaskStatus::Done | TaskStatus::Blocked => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: EntityId,
    pub list_id: Option<EntityId>,
    pub parent_task_id: Option<EntityId>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub position: i64,
    pub assignee_ids: Vec<UserId>,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProjectTask {
    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }
}

impl ContentShape for ProjectTask {
    const KIND: EntityKind = EntityKind::ProjectTask;

    fn validate(&self) -> StoreResult<()> {
        require_text("task title", &self.title)?;
        require_id("project_id", self.project_id)?;
        if self.position < 0 {
            return Err(EntityError::invalid_content("task position must not be negative"));
        }
        Ok(())
    }

    fn display_title(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn display_summary(&self) -> Option<String> {
        self.description.clone()
    }
}

fn require_id(field: &str, id: EntityId) -> StoreResult<()> {
    if id.is_nil() {
        return Err(EntityError::invalid_content(format!("{field} must be set")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_advances_until_done() {
        let mut status = TaskStatus::Todo;
        let mut visited = vec![status];
        while let Some(next) = status.next_in_flow() {
            status = next;
            visited.push(status);
        }
        assert_eq!(
            visited,
            vec![TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Review, TaskStatus::Done]
        );
        assert_eq!(TaskStatus::Blocked.next_in_flow(), None);
    }

    #[test]
    fn task_defaults_fill_missing_fields() {
        let project_id = EntityId::new_v4();
        let task: ProjectTask =
            serde_json::from_value(json!({"title": "Draft brief", "project_id": project_id})).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.list_id.is_none());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn task_without_project_is_invalid() {
        let task = ProjectTask {
            title: "Orphan".into(),
            ..ProjectTask::default()
        };
        assert!(task.validate().is_err());
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(TaskPriority::Urgent > TaskPriority::High);
        assert!(TaskPriority::Low < TaskPriority::Medium);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in_progress"));
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
    }
}
