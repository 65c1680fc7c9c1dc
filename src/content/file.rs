use super::{ContentShape, EntityKind, require_text};
use crate::core::{EntityId, StoreResult};
use serde::{Deserialize, Serialize};

/// Reference to an object in external storage; the bytes never pass through here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct File {
    pub name: String,
    pub storage_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    pub folder_id: Option<EntityId>,
}

impl ContentShape for File {
    const KIND: EntityKind = EntityKind::File;

    fn validate(&self) -> StoreResult<()> {
        require_text("file name", &self.name)?;
        require_text("storage path", &self.storage_path)
    }

    fn display_title(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn display_summary(&self) -> Option<String> {
        self.mime_type.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Folder {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ContentShape for Folder {
    const KIND: EntityKind = EntityKind::Folder;

    fn validate(&self) -> StoreResult<()> {
        require_text("folder name", &self.name)
    }

    fn display_title(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
