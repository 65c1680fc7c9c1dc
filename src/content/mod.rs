//! Typed views over entity content, one per statically known entity type.
//!
//! The store persists content as opaque JSON. These shapes are what the feature
//! façades write and read, and each one carries its own validator. Types that are
//! not listed in [`EntityKind`] are still accepted by the store and are checked only
//! against the runtime schema registry.

pub mod comment;
pub mod event;
pub mod file;
pub mod project;
pub mod vote;

pub use comment::Comment;
pub use event::Event;
pub use file::{File, Folder};
pub use project::{Project, ProjectList, ProjectTask, TaskPriority, TaskStatus};
pub use vote::{Vote, VoteSubmission, voter_hash};

use crate::core::{EntityError, StoreResult};
use crate::model::Entity;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    ProjectList,
    ProjectTask,
    Event,
    Vote,
    VoteSubmission,
    Comment,
    File,
    Folder,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Project,
        EntityKind::ProjectList,
        EntityKind::ProjectTask,
        EntityKind::Event,
        EntityKind::Vote,
        EntityKind::VoteSubmission,
        EntityKind::Comment,
        EntityKind::File,
        EntityKind::Folder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::ProjectList => "project_list",
            EntityKind::ProjectTask => "project_task",
            EntityKind::Event => "event",
            EntityKind::Vote => "vote",
            EntityKind::VoteSubmission => "vote_submission",
            EntityKind::Comment => "comment",
            EntityKind::File => "file",
            EntityKind::Folder => "folder",
        }
    }

    /// Fields the built-in schema for this kind marks as required.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Project => &["name"],
            EntityKind::ProjectList => &["name", "project_id"],
            EntityKind::ProjectTask => &["title", "project_id", "status", "priority"],
            EntityKind::Event => &["title", "start_time"],
            EntityKind::Vote => &["title", "vote_options"],
            EntityKind::VoteSubmission => &["vote_id", "choice_index"],
            EntityKind::Comment => &["body"],
            EntityKind::File => &["name", "storage_path"],
            EntityKind::Folder => &["name"],
        }
    }
}

impl FromStr for EntityKind {
    type Err = EntityError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| EntityError::InvalidValue(format!("unknown entity kind: {raw}")))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content payload with a statically known entity type.
pub trait ContentShape: Serialize + DeserializeOwned + Default + Send + Sync {
    const KIND: EntityKind;

    fn validate(&self) -> StoreResult<()>;

    /// Denormalized `title` column value.
    fn display_title(&self) -> Option<String> {
        None
    }

    /// Denormalized `summary` column value.
    fn display_summary(&self) -> Option<String> {
        None
    }
}

/// Parsed content, tagged by entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedContent {
    Project(Project),
    ProjectList(ProjectList),
    ProjectTask(ProjectTask),
    Event(Event),
    Vote(Vote),
    VoteSubmission(VoteSubmission),
    Comment(Comment),
    File(File),
    Folder(Folder),
}

impl TypedContent {
    /// Strictly parses `content` as the shape registered for `kind`.
    pub fn parse(kind: EntityKind, content: JsonValue) -> StoreResult<Self> {
        let typed = match kind {
            EntityKind::Project => TypedContent::Project(serde_json::from_value(content)?),
            EntityKind::ProjectList => TypedContent::ProjectList(serde_json::from_value(content)?),
            EntityKind::ProjectTask => TypedContent::ProjectTask(serde_json::from_value(content)?),
            EntityKind::Event => TypedContent::Event(serde_json::from_value(content)?),
            EntityKind::Vote => TypedContent::Vote(serde_json::from_value(content)?),
            EntityKind::VoteSubmission => {
                TypedContent::VoteSubmission(serde_json::from_value(content)?)
            }
            EntityKind::Comment => TypedContent::Comment(serde_json::from_value(content)?),
            EntityKind::File => TypedContent::File(serde_json::from_value(content)?),
            EntityKind::Folder => TypedContent::Folder(serde_json::from_value(content)?),
        };
        Ok(typed)
    }

    /// Strictly parses a stored row. `Ok(None)` for types without a static shape.
    pub fn from_entity(entity: &Entity) -> StoreResult<Option<Self>> {
        let Ok(kind) = entity.entity_type.parse::<EntityKind>() else {
            return Ok(None);
        };
        let content = match entity.content.as_deref() {
            Some(raw) => serde_json::from_str(raw)?,
            None => JsonValue::Object(Default::default()),
        };
        Self::parse(kind, content).map(Some)
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            TypedContent::Project(_) => EntityKind::Project,
            TypedContent::ProjectList(_) => EntityKind::ProjectList,
            TypedContent::ProjectTask(_) => EntityKind::ProjectTask,
            TypedContent::Event(_) => EntityKind::Event,
            TypedContent::Vote(_) => EntityKind::Vote,
            TypedContent::VoteSubmission(_) => EntityKind::VoteSubmission,
            TypedContent::Comment(_) => EntityKind::Comment,
            TypedContent::File(_) => EntityKind::File,
            TypedContent::Folder(_) => EntityKind::Folder,
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        match self {
            TypedContent::Project(content) => content.validate(),
            TypedContent::ProjectList(content) => content.validate(),
            TypedContent::ProjectTask(content) => content.validate(),
            TypedContent::Event(content) => content.validate(),
            TypedContent::Vote(content) => content.validate(),
            TypedContent::VoteSubmission(content) => content.validate(),
            TypedContent::Comment(content) => content.validate(),
            TypedContent::File(content) => content.validate(),
            TypedContent::Folder(content) => content.validate(),
        }
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(EntityError::invalid_content(format!("{field} must not be blank")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("wiki_page".parse::<EntityKind>().is_err());
    }

    #[test]
    fn typed_parse_dispatches_on_kind() {
        let content = json!({"title": "Pick a venue", "vote_options": ["Hall", "Park"]});
        let typed = TypedContent::parse(EntityKind::Vote, content).unwrap();
        assert_eq!(typed.kind(), EntityKind::Vote);
        assert!(typed.validate().is_ok());
    }

    #[test]
    fn typed_parse_rejects_wrong_shape() {
        let content = json!({"title": "Write docs", "status": "someday"});
        assert!(TypedContent::parse(EntityKind::ProjectTask, content).is_err());
    }

    #[test]
    fn rows_of_unknown_types_have_no_typed_view() {
        let row = crate::model::entity::sample_entity("wiki_page", Some(r#"{"x":1}"#));
        assert!(TypedContent::from_entity(&row).unwrap().is_none());

        let row = crate::model::entity::sample_entity("folder", Some(r#"{"name":"Docs"}"#));
        let typed = TypedContent::from_entity(&row).unwrap().unwrap();
        assert_eq!(typed.kind(), EntityKind::Folder);
        assert!(typed.validate().is_ok());

        let corrupt = crate::model::entity::sample_entity("folder", Some("{oops"));
        assert!(matches!(
            TypedContent::from_entity(&corrupt),
            Err(EntityError::Serialization(_))
        ));
    }

    #[test]
    fn typed_validate_reports_blank_fields() {
        let typed = TypedContent::parse(EntityKind::Comment, json!({"body": "   "})).unwrap();
        assert!(matches!(typed.validate(), Err(EntityError::InvalidContent(_))));
    }
}
