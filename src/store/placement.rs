use crate::core::{EntityId, EntityStatus, JsonMap, UserId};
use crate::model::CreateEntityInput;

/// Where a typed entity goes and who writes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPlacement {
    pub parent_id: Option<EntityId>,
    pub parent_type: Option<String>,
    pub created_by: Option<UserId>,
    pub status: Option<EntityStatus>,
    pub metadata: Option<JsonMap>,
}

impl EntityPlacement {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn under(parent_id: EntityId, parent_type: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id),
            parent_type: Some(parent_type.into()),
            ..Self::default()
        }
    }

    pub fn by(mut self, user_id: Option<UserId>) -> Self {
        self.created_by = user_id;
        self
    }

    pub fn status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn apply(self, mut input: CreateEntityInput) -> CreateEntityInput {
        input.parent_id = self.parent_id;
        input.parent_type = self.parent_type;
        input.created_by = self.created_by;
        input.status = self.status;
        input.metadata = self.metadata;
        input
    }
}
